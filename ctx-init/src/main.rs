use std::process::ExitCode;

use ctx_init::cli::{self, Cli};
use ctx_init::lifecycle::EXIT_FAILURE;
use ctx_init::{Config, LogConfig, Supervisor, logging, pid1};
use secret_store::EnvSnapshot;
use secret_store_aws::AwsSecretsManager;
use tracing::{Instrument, error, error_span};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_compat();
    if cli.version {
        println!("{}", cli::version());
        return ExitCode::SUCCESS;
    }

    let env = EnvSnapshot::capture();
    let log = LogConfig::from_env(&env);
    logging::init(&log);

    let span = error_span!("supervisor", component = logging::COMPONENT);
    let config = match Config::new(cli, log) {
        Ok(config) => config,
        Err(e) => {
            span.in_scope(|| error!(error = %e, "cannot start"));
            return ExitCode::FAILURE;
        }
    };

    let code = async {
        pid1::claim_orphans();
        Supervisor::new(&config, env, &AwsSecretsManager::new())
            .run()
            .await
    }
    .instrument(span)
    .await;

    ExitCode::from(u8::try_from(code).unwrap_or(EXIT_FAILURE as u8))
}
