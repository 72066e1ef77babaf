use amapi::{
    AuthInterceptor, Config, Configurator, CredentialStore, FileBlobCache, HttpExecutor,
    ServiceAccountIssuer, TokenCache, TokenIssuerAdapter,
    cli::{build_request, inject_json_headers, print_response_body},
    logging,
};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::{error::Error, io::stdout, path::PathBuf, process, sync::Arc};

#[derive(Parser)]
#[command(name = "amapi")]
#[command(about = "Command line client for the Android Management API")]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    request: RequestArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a service account key file and store it for later requests
    Configure {
        /// Path to the service account key JSON file
        key_file: PathBuf,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// HTTP method, e.g. GET, POST, PATCH, DELETE
    #[arg(required = true)]
    method: Option<String>,

    /// Path below the API base URL, e.g. /enterprises
    #[arg(required = true)]
    path: Option<String>,

    /// name==value (query), Name:value (header) or name=value (JSON body field).
    /// `{projectId}` in query values is replaced by the configured project id.
    items: Vec<String>,

    /// Raw JSON request body
    #[arg(long)]
    data: Option<String>,
}

/// Cache, stores and issuer shared by both commands
struct Services {
    credentials: CredentialStore,
    tokens: TokenCache,
    issuer: TokenIssuerAdapter,
}

impl Services {
    fn new(config: &Config) -> Result<Self, Box<dyn Error>> {
        let cache = Arc::new(FileBlobCache::new(&config.cache_root));
        let issuer = ServiceAccountIssuer::new(&config.token_uri)?;
        Ok(Self {
            credentials: CredentialStore::new(cache.clone()),
            tokens: TokenCache::new(cache),
            issuer: TokenIssuerAdapter::new(Arc::new(issuer)),
        })
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Configure { key_file }) => configure(key_file).await,
        None => run_request(cli.request).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn configure(key_file: PathBuf) -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    let services = Services::new(&config)?;

    let report = Configurator {
        credentials: &services.credentials,
        tokens: &services.tokens,
        issuer: &services.issuer,
    }
    .configure_from_file(&key_file)
    .await?;

    println!("credentials are stored in {}", report.credentials_location);
    println!("access token is stored in {}", report.access_token_location);
    Ok(())
}

async fn run_request(args: RequestArgs) -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    let services = Services::new(&config)?;
    let executor = HttpExecutor::new(config.base_url.clone())?;

    let (Some(method), Some(path)) = (args.method, args.path) else {
        return Err("method and path are required".into());
    };
    let mut request = build_request(&method, &path, &args.items, args.data.as_deref())?;
    inject_json_headers(&mut request);

    let interceptor = AuthInterceptor::new(services.credentials, services.tokens, services.issuer);
    let response = interceptor.authorize(&executor, &mut request).await?;

    if let Some(body) = &response.body {
        print_response_body(body, &mut stdout().lock())?;
    }
    if response.status >= 400 {
        return Err(format!("request failed with status {}", response.status).into());
    }
    Ok(())
}
