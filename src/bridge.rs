use tokio::sync::mpsc;

use crate::types::{Perception, Plan, ResolvedAction};

/// Messages the worker posts back to the controller. Producer side is the
/// single active worker; consumer side is the front-end poll.
#[derive(Debug)]
pub enum WorkerMsg {
    /// Observation and initial plan succeeded; awaiting the user's go-ahead.
    PlanReady {
        plan: Plan,
        instruction: String,
        budget: u32,
        perception: Perception,
    },
    /// One step of the run finished successfully.
    StepExecuted { number: u32, action: ResolvedAction },
    /// The run ended without error: empty plan or budget reached.
    RunFinished { steps_done: u32 },
    /// A collaborator failed; what it means depends on the current status.
    Failure { message: String },
}

/// Ordered, unbounded worker-to-front-end channel. The sender never blocks;
/// the consumer drains everything queued on each poll tick.
pub struct EventBridge {
    rx: mpsc::UnboundedReceiver<WorkerMsg>,
}

impl EventBridge {
    pub fn channel() -> (mpsc::UnboundedSender<WorkerMsg>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Every message queued so far, in arrival order. Never waits.
    pub fn drain(&mut self) -> Vec<WorkerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}
