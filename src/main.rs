//! Safe Proxy Address Predictor CLI
//!
//! Usage:
//!   safe_proxy_predict --factory 0x.. --singleton 0x.. -i 0xb63e800d.. -n 42 --rpc-url http://..
//!   safe_proxy_predict ... --creation-code 0x6080.. --chain-id 1
//!   safe_proxy_predict ... --backend zksync --rpc-url https://mainnet.era.zksync.io --count 1000

use std::process;
use std::sync::atomic::Ordering;
use std::time::Duration;

use alloy::providers::ProviderBuilder;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use safe_proxy_predict::config::{CodeSource, LogFormat};
use safe_proxy_predict::{
    predict_variant, Config, PredictError, ProxyDeployment, ProxyFactory, Request, RpcFactory,
    StaticFactory, SweepJob, SweepResult, Verification, WorkerPanicked, WorkerPool,
};

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error(transparent)]
    Workers(#[from] WorkerPanicked),
    #[error("sweep task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() {
    let config = Config::parse();

    let request = match config.validate() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    init_tracing(config.log_format);

    let status = match &request.source {
        CodeSource::Rpc(url) => {
            let provider = ProviderBuilder::new().connect_http(url.clone());
            let factory = RpcFactory::new(request.factory, provider);
            match run(&config, &request, &factory).await {
                Ok(results) if request.check_deployed => check_deployed(&factory, &results)
                    .await
                    .map(|()| results)
                    .map_err(RunError::from),
                other => other,
            }
        }
        CodeSource::Static(code) => {
            let factory = StaticFactory::new(request.factory, code.clone());
            run(&config, &request, &factory).await
        }
    };

    let results = match status {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "prediction failed");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let verification = Verification::check(request.expect, results.first().map(|r| r.address));
    match verification {
        Verification::Unchecked => {}
        Verification::Match(expected) => println!("Matches expected address {}", expected),
        Verification::Mismatch {
            expected,
            predicted,
        } => {
            let predicted = predicted.map(|a| a.to_string()).unwrap_or_default();
            eprintln!("Mismatch: expected {}, predicted {}", expected, predicted);
        }
    }
    process::exit(verification.exit_code());
}

fn init_tracing(format: LogFormat) {
    let subscriber = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "safe_proxy_predict=info".into()),
    );
    match format {
        LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run<F: ProxyFactory>(
    config: &Config,
    request: &Request,
    factory: &F,
) -> Result<Vec<SweepResult>, RunError> {
    println!("Safe Proxy Address Predictor");
    println!("============================");
    println!("Factory:    {}", request.factory);
    println!("Singleton:  {}", request.singleton);
    println!("Backend:    {}", request.backend);
    println!("Salt:       {}", request.variant);
    println!();

    let results = if request.count == 1 {
        let address = predict_variant(
            factory,
            request.backend,
            &request.singleton,
            &request.initializer,
            &request.nonce,
            &request.variant,
        )
        .await?;
        vec![SweepResult {
            nonce: request.nonce,
            salt: request.variant.compose(&request.initializer, &request.nonce),
            address,
        }]
    } else {
        sweep(config, request, factory).await?
    };

    for (i, result) in results.iter().enumerate() {
        print_result(result, i + 1);
    }
    Ok(results)
}

/// Reads the creation code once and predicts `request.count` nonces from that snapshot.
async fn sweep<F: ProxyFactory>(
    config: &Config,
    request: &Request,
    factory: &F,
) -> Result<Vec<SweepResult>, RunError> {
    let creation_code = factory.creation_code().await?;
    let deployment = ProxyDeployment::prepare(
        request.backend,
        &factory.address(),
        &request.singleton,
        &creation_code,
    )
    .map_err(PredictError::from)?;
    let job = SweepJob::new(
        deployment,
        &request.initializer,
        request.variant,
        request.nonce,
        request.count,
    );

    info!(
        workers = config.worker_count(),
        count = request.count,
        "sweeping nonces (Press Ctrl+C to stop)"
    );

    let pool = WorkerPool::new(config.worker_count(), job);
    let stop_flag = pool.stop_flag_clone();
    if let Err(e) = ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    }) {
        error!(error = %e, "cannot install Ctrl-C handler");
    }

    let report_interval = Duration::from_secs(config.report_interval.max(1));
    let results = tokio::task::spawn_blocking(move || pool.collect(report_interval)).await??;

    if (results.len() as u64) < request.count {
        println!(
            "Stopped after {} of {} nonces.\n",
            results.len(),
            request.count
        );
    }
    Ok(results)
}

async fn check_deployed<P>(
    factory: &RpcFactory<P>,
    results: &[SweepResult],
) -> Result<(), PredictError>
where
    P: alloy::providers::Provider + Clone,
{
    for result in results {
        let deployed = factory.is_deployed(&result.address).await?;
        println!("{}", result.deployment_status(deployed));
    }
    Ok(())
}

fn print_result(result: &SweepResult, index: usize) {
    println!("=== Prediction #{} ===", index);
    println!("Address:      {}", result.address);
    println!("Nonce (dec):  {}", result.nonce);
    println!("Salt (hex):   0x{}", result.salt_hex());
    println!();
}
