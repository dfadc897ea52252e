use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "pullpo")]
#[command(about = "Capability-aware GitHub API queries from the command line", version)]
#[command(after_help = "EXAMPLES:
    pullpo issue list -R cli/cli --fields number,title  List issues with chosen fields
    pullpo resolve -R OWNER/REPO --label bug            Resolve a label to its ID
    pullpo features --hostname git.example.com          Show detected schema features
    pullpo api repos/OWNER/REPO/issues --paginate       Fetch every page of an endpoint")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json)
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Output as JSON (alias for --format json)
    #[arg(long, global = true, hide = true)]
    pub json: bool,

    /// Suppress informational messages
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Show debug logs and detailed error information
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Get the effective output format, considering --json flag
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Make an authenticated API request
    #[command(after_help = "EXAMPLES:
    pullpo api repos/OWNER/REPO
    pullpo api repos/OWNER/REPO/labels --paginate
    pullpo api -X POST repos/OWNER/REPO/issues -f title=Bug -f body=Details
    pullpo api graphql -f query='query { viewer { login } }'")]
    Api(ApiArgs),
    /// Show which optional schema features a host supports
    #[command(after_help = "EXAMPLES:
    pullpo features
    pullpo features --hostname git.example.com --json")]
    Features {
        /// Host to probe (defaults to GH_HOST or the configured host)
        #[arg(long)]
        hostname: Option<String>,
    },
    /// Resolve names of users, teams, labels, milestones and projects to IDs
    #[command(after_help = "EXAMPLES:
    pullpo resolve -R OWNER/REPO --assignee monalisa --label bug
    pullpo resolve -R OWNER/REPO --reviewer OWNER/core --reviewer hubot
    pullpo resolve -R OWNER/REPO --milestone v1.0 --project Roadmap")]
    Resolve(ResolveArgs),
    /// Work with issues
    Issue {
        #[command(subcommand)]
        action: ListCommands,
    },
    /// Work with pull requests
    Pr {
        #[command(subcommand)]
        action: ListCommands,
    },
    /// Generate shell completions
    #[command(after_help = "EXAMPLES:
    pullpo completions bash > ~/.bash_completion.d/pullpo
    pullpo completions zsh > ~/.zfunc/_pullpo
    pullpo completions fish > ~/.config/fish/completions/pullpo.fish")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// List open items of a repository
    #[command(after_help = "EXAMPLES:
    pullpo issue list -R OWNER/REPO
    pullpo pr list -R OWNER/REPO --fields number,title,isDraft --limit 50")]
    List(ListArgs),
}

#[derive(Args)]
pub struct ApiArgs {
    /// Endpoint path (e.g. repos/OWNER/REPO) or `graphql`
    pub endpoint: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Add a string parameter in key=value format
    #[arg(short = 'f', long = "raw-field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Fetch all pages of results
    #[arg(long)]
    pub paginate: bool,

    /// Host to send the request to
    #[arg(long)]
    pub hostname: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Repository as [HOST/]OWNER/REPO
    #[arg(short = 'R', long)]
    pub repo: String,

    /// Assignee login
    #[arg(short, long)]
    pub assignee: Vec<String>,

    /// Reviewer login, or ORG/TEAM for a team
    #[arg(short, long)]
    pub reviewer: Vec<String>,

    /// Label name
    #[arg(short, long)]
    pub label: Vec<String>,

    /// Milestone title
    #[arg(short, long)]
    pub milestone: Option<String>,

    /// Project name or title
    #[arg(short, long)]
    pub project: Vec<String>,

    /// Fetch every candidate instead of looking names up directly
    #[arg(long)]
    pub enumerate: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Repository as [HOST/]OWNER/REPO
    #[arg(short = 'R', long)]
    pub repo: String,

    /// Comma-separated fields to fetch
    #[arg(long = "fields", value_delimiter = ',', default_value = "number,title,state,url")]
    pub fields: Vec<String>,

    /// Maximum number of items (0 for all)
    #[arg(short = 'L', long, default_value = "30")]
    pub limit: i64,
}
