//! Running one think call on its own thread under a deadline.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use tracing::{instrument, trace, warn};

use crate::board::Board;
use crate::creature::{Creature, CreatureId, Move};
use crate::game_interface::Agent;

/// What came back from a think step.
pub(crate) enum ThinkResult {
    /// The agent answered before the deadline. `reply` is an error when the agent
    /// returned one or panicked.
    Completed {
        agent: Box<dyn Agent>,
        creature: Creature,
        reply: anyhow::Result<Move>,
        elapsed: Duration,
    },
    /// No answer before the deadline. The worker thread is left running on its own and
    /// the agent is gone with it.
    TimedOut { elapsed: Duration },
    /// The worker thread died before it could answer, taking the agent with it.
    Crashed { elapsed: Duration },
}

impl ThinkResult {
    pub(crate) fn elapsed(&self) -> Duration {
        match self {
            ThinkResult::Completed { elapsed, .. }
            | ThinkResult::TimedOut { elapsed }
            | ThinkResult::Crashed { elapsed } => *elapsed,
        }
    }
}

type WorkerReply = (Box<dyn Agent>, Creature, anyhow::Result<Move>);

/// Run one think call of `agent` on its own thread, waiting at most `deadline`.
///
/// `view` and `creature` are moved into the worker, so nothing the agent does can reach the
/// live match state.
#[instrument(skip_all, fields(creature = %id))]
pub(crate) fn think(
    id: CreatureId,
    mut agent: Box<dyn Agent>,
    view: Board,
    mut creature: Creature,
    deadline: Duration,
) -> anyhow::Result<ThinkResult> {
    let (tx, rx) = mpsc::channel::<WorkerReply>();

    let start = Instant::now();
    thread::Builder::new()
        .name(format!("think-{id}"))
        .spawn(move || {
            let reply = panic::catch_unwind(AssertUnwindSafe(|| agent.think(&view, &mut creature)))
                .unwrap_or_else(|payload| {
                    Err(anyhow!("agent panicked: {}", panic_message(&*payload)))
                });
            // the receiver is gone when the deadline already passed
            let _ = tx.send((agent, creature, reply));
        })
        .context("could not spawn think thread")?;

    let result = match rx.recv_timeout(deadline) {
        Ok((agent, creature, reply)) => ThinkResult::Completed {
            agent,
            creature,
            reply,
            elapsed: start.elapsed(),
        },
        Err(RecvTimeoutError::Timeout) => {
            warn!("no answer after {deadline:?}, abandoning think thread");
            ThinkResult::TimedOut {
                elapsed: start.elapsed(),
            }
        }
        // a panic escaped catch_unwind, e.g. from dropping the panic payload
        Err(RecvTimeoutError::Disconnected) => {
            warn!("think thread died without answering");
            ThinkResult::Crashed {
                elapsed: start.elapsed(),
            }
        }
    };
    trace!(elapsed = ?result.elapsed());
    Ok(result)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
