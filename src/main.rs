mod client;
mod config;
mod executor;
mod metrics;
mod report;
mod threshold;
mod worker;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use hyper::Uri;

use client::HttpClient;
use config::Config;
use metrics::Recorder;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of virtual users
    #[arg(short = 'u', long, default_value_t = 50)]
    vus: usize,

    /// Duration of the run in seconds
    #[arg(short = 'd', long, default_value_t = 15)]
    duration: u64,

    /// Timeout for each request in seconds
    #[arg(short = 'T', long, default_value_t = 5)]
    timeout: u64,

    /// Status code counted as a success
    #[arg(short = 's', long = "status", default_value_t = 200)]
    expected_status: u16,

    /// Threshold expression, repeatable (e.g. http_req_failed.rate<0.01)
    #[arg(short = 't', long = "threshold")]
    thresholds: Vec<String>,

    /// Target URL; falls back to the TARGET_URL environment variable
    #[arg(env = "TARGET_URL")]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = match Config::new(
        args.url,
        args.vus,
        Duration::from_secs(args.duration),
        Duration::from_secs(args.timeout),
        args.expected_status,
        &args.thresholds,
    ) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    match run(&config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// One constant-VUs run end to end. Returns whether all thresholds passed.
async fn run(config: &Config) -> Result<bool> {
    println!(
        "Running {:?} test @ {} with {} VUs (expecting status {})",
        config.duration, config.url, config.vus, config.expected_status
    );

    let uri: Uri = config.url.as_str().parse()?;
    let client = Arc::new(HttpClient::new(config.timeout, config.expected_status));
    let recorder = Arc::new(Recorder::new());

    let scenario = move || {
        let client = Arc::clone(&client);
        let uri = uri.clone();
        async move { Ok(client.get(&uri).await) }
    };
    executor::run_constant_vus(config.vus, config.duration, scenario, Arc::clone(&recorder))
        .await?;

    let snap = recorder.snapshot();
    let results = threshold::evaluate(&config.thresholds, &snap);
    report::print_summary(config, &snap);
    Ok(report::print_thresholds(&results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::{Bytes, Incoming};
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use tokio::net::TcpListener;

    async fn spawn_status_server(status: StatusCode) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { break };
                tokio::spawn(async move {
                    let service = service_fn(move |_req: Request<Incoming>| async move {
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(status)
                                .body(Full::new(Bytes::from_static(b"ok")))
                                .unwrap(),
                        )
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });
        format!("http://{addr}/")
    }

    fn short_run_config(url: String, expected_status: u16) -> Config {
        Config::new(
            Some(url),
            4,
            Duration::from_millis(300),
            Duration::from_secs(2),
            expected_status,
            &[
                "http_req_failed.rate<0.01".to_string(),
                "http_req_duration.p95<500".to_string(),
            ],
        )
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn healthy_server_passes_all_thresholds() {
        let url = spawn_status_server(StatusCode::TEMPORARY_REDIRECT).await;
        let config = short_run_config(url, 307);
        assert!(run(&config).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn erroring_server_fails_the_failure_rate_threshold() {
        let url = spawn_status_server(StatusCode::INTERNAL_SERVER_ERROR).await;
        let config = short_run_config(url, 307);
        assert!(!run(&config).await.unwrap());
    }
}
