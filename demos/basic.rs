//! # Example: basic
//!
//! Runs three workloads and prints how each one ended:
//! - a quick one that finishes inside its timeout;
//! - a slow one that ignores its context and is reported as timed out;
//! - a cooperative one that stops as soon as the deadline is observed.
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use std::time::Duration;

use taskguard::{Context, TaskError, run, with_name, with_timeout};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let root = Context::background();

    // 1. Finishes well before the deadline.
    let quick = run(
        &root,
        |_ctx: Context| async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        },
        [with_name("quick"), with_timeout(Duration::from_millis(100))],
    )
    .await;
    println!("[quick] {quick:?}");

    // 2. Ignores cancellation; `run` still waits for it, then reports the timeout.
    let slow = run(
        &root,
        |_ctx: Context| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(())
        },
        [with_name("slow"), with_timeout(Duration::from_millis(100))],
    )
    .await;
    match &slow {
        Err(e) if e.is_timeout() => println!("[slow] timed out: {e}"),
        other => println!("[slow] unexpected: {other:?}"),
    }

    // 3. Checks its context between steps and returns early.
    let cooperative = run(
        &root,
        |ctx: Context| async move {
            for step in 1.. {
                if ctx.is_done() {
                    println!("[cooperative] stopping after {} steps", step - 1);
                    return Err(TaskError::Canceled);
                }
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            Ok(())
        },
        [with_name("cooperative"), with_timeout(Duration::from_millis(100))],
    )
    .await;
    if let Err(e) = &cooperative {
        for member in e.members() {
            println!("[cooperative] {} ({})", member, member.as_label());
        }
    }

    Ok(())
}
