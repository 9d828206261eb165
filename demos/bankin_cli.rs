use bankin::{Client, Credentials, Lang, ListOptions, Page};
use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;

#[derive(Debug, Parser)]
#[command(name = "bankin-cli", about = "CLI wrapper for the Bankin sync API")]
struct Cli {
    /// Client id; falls back to BANKIN_CLIENT_ID env var
    #[arg(long, env = "BANKIN_CLIENT_ID")]
    client_id: String,

    /// Client secret; falls back to BANKIN_CLIENT_SECRET env var
    #[arg(long, env = "BANKIN_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// API version (YYYY-MM-DD)
    #[arg(long, env = "BANKIN_VERSION", default_value = bankin::transport::DEFAULT_VERSION)]
    version: String,

    /// Follow next_uri until the last page
    #[arg(long, global = true)]
    all: bool,

    /// Page size
    #[arg(long, global = true, default_value_t = 50)]
    limit: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List supported banks
    Banks,
    /// Show a single bank
    Bank {
        #[arg(long)]
        id: u64,
    },
    /// List transaction categories
    Categories {
        #[arg(long, value_enum, default_value = "en")]
        lang: LangArg,
    },
    /// List users of the application
    Users,
    /// Create a user
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BANKIN_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and list the user's accounts
    Accounts {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BANKIN_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and list the user's transactions
    Transactions {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BANKIN_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and print the bank connection URL
    ConnectUrl {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BANKIN_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        bank_id: u64,
        #[arg(long)]
        redirect_url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LangArg {
    En,
    Fr,
}

impl From<LangArg> for Lang {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Lang::En,
            LangArg::Fr => Lang::Fr,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let credentials = Credentials::new(cli.client_id, cli.client_secret).with_version(cli.version)?;
    let client = Client::with_credentials(credentials)?;
    let options = ListOptions::new().limit(cli.limit);

    match cli.command {
        Commands::Banks => {
            let page = client.banks().list(&options).await?;
            print_pages(page, cli.all).await?;
        }
        Commands::Bank { id } => {
            let bank = client.banks().get(id).await?;
            println!("{} | {} | {}", bank.id, bank.name, bank.country_code.unwrap_or_default());
        }
        Commands::Categories { lang } => {
            let page = client.categories().list(&options, lang.into()).await?;
            print_pages(page, cli.all).await?;
        }
        Commands::Users => {
            let page = client.users().list(&options).await?;
            print_pages(page, cli.all).await?;
        }
        Commands::CreateUser { email, password } => {
            let user = client.users().create(&email, &password).await?;
            println!("Created user {} ({})", user.uuid, user.email);
        }
        Commands::Accounts { email, password } => {
            let session = client.users().auth(&email, &password).await?;
            let page = session.accounts().list(&options).await?;
            print_pages(page, cli.all).await?;
        }
        Commands::Transactions { email, password } => {
            let session = client.users().auth(&email, &password).await?;
            let page = session.transactions().list(&options).await?;
            print_pages(page, cli.all).await?;
        }
        Commands::ConnectUrl {
            email,
            password,
            bank_id,
            redirect_url,
        } => {
            let session = client.users().auth(&email, &password).await?;
            let url = session
                .items()
                .connect_url(bank_id, redirect_url.as_deref())?;
            println!("{url}");
        }
    }

    Ok(())
}

async fn print_pages(first: Page, all: bool) -> Result<(), Box<dyn Error>> {
    let mut page = first;
    loop {
        for resource in page.resources() {
            println!("{resource}");
        }
        if !all || !page.has_next() {
            break;
        }
        page = page.next().await?;
    }
    Ok(())
}
