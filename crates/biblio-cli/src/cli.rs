use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use biblio_core::storage::{LoanState, Role};
use biblio_core::VERSION;

/// Biblio - lending ledger for a small library's books and members
#[derive(Parser)]
#[command(name = "biblio")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the library database
    #[arg(long, global = true, env = "BIBLIO_DB")]
    pub db: Option<String>,

    /// Act as the member with this email (limits what you can see and change)
    #[arg(long = "as", global = true, env = "BIBLIO_AS", value_name = "EMAIL")]
    pub as_member: Option<String>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true, env = "BIBLIO_TODAY", value_name = "DATE")]
    pub today: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, plain)
    #[arg(long, global = true, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Disable colors
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols only
    #[arg(long, global = true)]
    pub ascii: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a library database and write the config file
    Init(InitArgs),

    /// Manage the catalog
    #[command(subcommand)]
    Book(BookCommand),

    /// Manage members
    #[command(subcommand)]
    Member(MemberCommand),

    /// Lend and return books
    #[command(subcommand)]
    Loan(LoanCommand),

    /// Check database integrity
    Check,

    /// Write a consistent copy of the database
    Backup(BackupArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the database will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Default loan length in days
    #[arg(long)]
    pub loan_days: Option<u32>,

    /// Register the first administrator with this email
    #[arg(long, value_name = "EMAIL", requires = "admin_name")]
    pub admin_email: Option<String>,

    /// Name of the first administrator
    #[arg(long, value_name = "NAME", requires = "admin_email")]
    pub admin_name: Option<String>,

    /// Config path override
    #[arg(long)]
    pub config_path: Option<String>,
}

#[derive(Subcommand)]
pub enum BookCommand {
    /// Add a book to the catalog
    Add(BookAddArgs),

    /// Edit a book
    Edit(BookEditArgs),

    /// List books
    List(BookListArgs),

    /// Show a book and its availability
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Search books by title
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// List books with at least one copy on the shelf
    Available {
        /// Only titles containing this text
        #[arg(value_name = "QUERY")]
        query: Option<String>,
    },

    /// Delete a book and its returned loans
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Import books from a JSON file ("-" for stdin)
    Import {
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// Export the catalog as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,
    },
}

#[derive(Args)]
pub struct BookAddArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub author: String,

    /// Number of copies owned
    #[arg(long, default_value_t = 1)]
    pub copies: u32,

    #[arg(long)]
    pub publisher: Option<String>,

    /// Publication year (1900-2026)
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct BookEditArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long, conflicts_with = "clear_publisher")]
    pub publisher: Option<String>,

    #[arg(long)]
    pub clear_publisher: bool,

    #[arg(long, conflicts_with = "clear_year")]
    pub year: Option<i32>,

    #[arg(long)]
    pub clear_year: bool,

    #[arg(long, conflicts_with = "clear_category")]
    pub category: Option<String>,

    #[arg(long)]
    pub clear_category: bool,

    #[arg(long)]
    pub copies: Option<u32>,
}

#[derive(Args)]
pub struct BookListArgs {
    /// Only books whose author contains this text
    #[arg(long, conflicts_with = "category")]
    pub author: Option<String>,

    /// Only books in this category
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Subcommand)]
pub enum MemberCommand {
    /// Register a member and issue a generated credential
    Register(MemberRegisterArgs),

    /// List members
    List,

    /// Show a member and their open loans
    Show {
        /// Member ID or email
        #[arg(value_name = "MEMBER")]
        member: String,
    },

    /// Edit a member
    Edit(MemberEditArgs),

    /// Issue a new generated credential
    ResetCredential {
        /// Member ID or email
        #[arg(value_name = "MEMBER")]
        member: String,
    },

    /// Delete a member and their returned loans
    Delete {
        /// Member ID or email
        #[arg(value_name = "MEMBER")]
        member: String,
    },
}

#[derive(Args)]
pub struct MemberRegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    /// Role to grant (honoured only when acting as an admin)
    #[arg(long, default_value = "user")]
    pub role: Role,
}

#[derive(Args)]
pub struct MemberEditArgs {
    /// Member ID or email
    #[arg(value_name = "MEMBER")]
    pub member: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub role: Option<Role>,
}

#[derive(Subcommand)]
pub enum LoanCommand {
    /// Lend a copy of a book to a member
    Create(LoanCreateArgs),

    /// Mark a loan as returned
    Return {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// List loans
    List(LoanListArgs),

    /// Show a loan
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete a returned loan
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Args)]
pub struct LoanCreateArgs {
    /// Book ID
    #[arg(value_name = "BOOK")]
    pub book: String,

    /// Member ID or email (defaults to the --as member)
    #[arg(long, value_name = "MEMBER")]
    pub member: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "days")]
    pub due: Option<String>,

    /// Loan length in days from today
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Args)]
pub struct LoanListArgs {
    /// Member ID or email
    #[arg(long, value_name = "MEMBER")]
    pub member: Option<String>,

    /// Book ID
    #[arg(long, value_name = "BOOK")]
    pub book: Option<String>,

    /// Only loans in this state (active, overdue, returned)
    #[arg(long, conflicts_with_all = ["open", "returned"])]
    pub state: Option<LoanState>,

    /// Active and overdue loans, soonest due first
    #[arg(long, conflicts_with = "returned")]
    pub open: bool,

    /// Returned loans, latest due first
    #[arg(long)]
    pub returned: bool,

    /// Limit number of results
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the `backup` command
#[derive(Args)]
pub struct BackupArgs {
    /// Destination path
    #[arg(value_name = "DEST")]
    pub destination: String,
}
