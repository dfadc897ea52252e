//! Page-at-a-time traversal of GraphQL connections and REST list endpoints.

mod array_reader;
mod cursor;
mod link;
mod walker;

pub use array_reader::PaginatedArrayReader;
pub use cursor::{scan_page_info, PageState};
pub use link::{add_per_page, find_next_page};
pub use walker::{collect_graphql, collect_rest, stream_rest_array, GraphqlPager, Limit, RestPage, RestPager};

/// Page size for every enumeration query and REST list call.
pub const PER_PAGE: u32 = 100;
