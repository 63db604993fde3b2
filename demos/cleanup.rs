//! # Example: cleanup
//!
//! A workload that overruns its deadline, a cleanup callback that fails, and a
//! [`LogWriter`] subscriber printing every lifecycle event along the way.
//!
//! ## Flow
//! ```text
//! run()
//!   ├─► publish TaskStarting
//!   ├─► Worker: workload sleeps past the deadline
//!   ├─► Watcher: deadline → publish TimeoutHit
//!   │                     → publish CancelStarting → cleanup() → Err → publish CancelFailed
//!   ├─► Worker: workload returns → publish TaskStopped
//!   └─► Err(Group[timeout, "release lock failed"])
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example cleanup --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskguard::{
    Bus, Context, LogWriter, Subscribe, SubscriberSet, TaskError, run, with_bus, with_cancel,
    with_cancel_timeout, with_name, with_timeout,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Event plumbing: bus → subscriber set → stdout
    let bus = Bus::new(64);
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let set = SubscriberSet::listen(subs, &bus);

    // 2. A workload that does not look at its context
    let res = run(
        &Context::background(),
        |_ctx: Context| async {
            tokio::time::sleep(Duration::from_millis(400)).await;
            Ok(())
        },
        [
            with_name("import"),
            with_timeout(Duration::from_millis(100)),
            with_cancel_timeout(Duration::from_secs(1)),
            with_bus(bus.clone()),
            with_cancel(|ctx: Context| async move {
                println!("[cleanup] cause={:?}", ctx.cause().map(|c| c.as_label()));
                Err(TaskError::fail("release lock failed"))
            }),
        ],
    )
    .await;

    // 3. Let the subscriber drain, then inspect the aggregated result
    tokio::time::sleep(Duration::from_millis(50)).await;
    set.shutdown().await;

    let err = res.expect_err("the workload overran its deadline");
    println!("timed out: {}", err.is_timeout());
    for member in err.members() {
        println!("  - {} ({})", member, member.as_label());
    }
    Ok(())
}
