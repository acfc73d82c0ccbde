use std::sync::Arc;
use std::time::Duration;

use chronolog_core::{InMemoryTaskLog, TaskId, TaskLog, TaskLogConfig};
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // (A) build the log; the poll bound is short so the demo exits cleanly
    let config = TaskLogConfig {
        lanes: 4,
        poll_timeout: Duration::from_secs(2),
    };
    let log = Arc::new(InMemoryTaskLog::new(config));

    // (B) one consumer printing completions until a poll times out
    let consumer = {
        let log = Arc::clone(&log);
        tokio::spawn(async move {
            loop {
                match log.poll().await {
                    Ok(line) => println!("{line}"),
                    Err(err) => {
                        println!("poll gave up: {err}");
                        break;
                    }
                }
            }
        })
    };

    // (C) tasks end out of start order; completions still print in it
    log.start(TaskId::new("alpha"), 1);
    log.start(TaskId::new("beta"), 2);
    log.start(TaskId::new("gamma"), 3);

    log.end(TaskId::new("beta"));
    sleep(Duration::from_millis(50)).await;
    log.end(TaskId::new("gamma"));
    sleep(Duration::from_millis(50)).await;
    log.end(TaskId::new("alpha"));

    let _ = consumer.await;

    println!(
        "counts: {}",
        serde_json::to_string(&log.counts().await).unwrap()
    );
    log.shutdown().await;
}
