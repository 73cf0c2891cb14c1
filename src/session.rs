use tokio::sync::{broadcast, mpsc};
use tokio::time::{Duration, interval};

use crate::brain::PlanningClient;
use crate::bridge::{EventBridge, WorkerMsg};
use crate::errors::AgentError;
use crate::eyes::PerceptionSource;
use crate::hands::ActionExecutor;
use crate::types::{Perception, Plan, ResolvedAction};
use crate::validator::validate;

/// Where a session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    RequestingPlan,
    AwaitingConfirmation,
    Iterating,
    Completed,
    Failed,
    Aborted,
}

/// One user-submitted run. Owned exclusively by the controller; the front
/// end only raises events.
#[derive(Debug)]
pub struct Session {
    pub instruction: String,
    pub budget: u32,
    pub steps_completed: u32,
    pub status: Status,
    pub last_perception: Option<Perception>,
}

impl Session {
    fn idle() -> Self {
        Self {
            instruction: String::new(),
            budget: 0,
            steps_completed: 0,
            status: Status::Idle,
            last_perception: None,
        }
    }
}

/// Events raised by the front end.
#[derive(Debug, Clone)]
pub enum UiEvent {
    Submit { instruction: String, budget: u32 },
    Confirm { accept: bool },
    Acknowledge,
}

/// Updates pushed to the front end's append-only log stream.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    Log { line: String },
    PlanPending { plan: String, budget: u32 },
    Step { number: u32, description: String },
    TaskComplete { summary: String },
    TaskError { message: String },
    Aborted,
    Ready,
}

/// Jobs the controller hands to the single worker.
#[derive(Debug)]
pub enum WorkerJob {
    RequestPlan { instruction: String, budget: u32 },
    RunSteps { instruction: String, budget: u32 },
}

/// Owns the three collaborators and processes jobs one at a time. Blocking
/// here is fine; the front end only ever talks to the bridge.
pub struct Worker<P, B, H> {
    eyes: P,
    brain: B,
    hands: H,
    bridge: mpsc::UnboundedSender<WorkerMsg>,
}

impl<P, B, H> Worker<P, B, H>
where
    P: PerceptionSource,
    B: PlanningClient,
    H: ActionExecutor,
{
    pub fn new(eyes: P, brain: B, hands: H, bridge: mpsc::UnboundedSender<WorkerMsg>) -> Self {
        Self { eyes, brain, hands, bridge }
    }

    /// Consume jobs until the controller goes away.
    pub async fn run(mut self, mut jobs: mpsc::UnboundedReceiver<WorkerJob>) {
        while let Some(job) = jobs.recv().await {
            match job {
                WorkerJob::RequestPlan { instruction, budget } => {
                    self.request_plan(instruction, budget).await;
                }
                WorkerJob::RunSteps { instruction, budget } => {
                    self.run_steps(&instruction, budget).await;
                }
            }
        }
    }

    async fn request_plan(&mut self, instruction: String, budget: u32) {
        let msg = match self.observe_and_plan(&instruction).await {
            Ok((plan, perception)) => WorkerMsg::PlanReady { plan, instruction, budget, perception },
            Err(e) => WorkerMsg::Failure { message: e.to_string() },
        };
        let _ = self.bridge.send(msg);
    }

    async fn observe_and_plan(&mut self, instruction: &str) -> Result<(Plan, Perception), AgentError> {
        let perception = self.eyes.capture().await?;
        let plan = self.brain.plan(instruction, &perception).await?;
        Ok((plan, perception))
    }

    /// One budget-bounded execution run: observe, re-plan against the fresh
    /// observation, execute the first proposed action, repeat. Stops on an
    /// empty plan, on the budget, or on the first error.
    async fn run_steps(&mut self, instruction: &str, budget: u32) {
        let mut steps_done = 0u32;
        while steps_done < budget {
            let (plan, perception) = match self.observe_and_plan(instruction).await {
                Ok(v) => v,
                Err(e) => return self.fail(e),
            };

            // Only the first action of each round is executed; the rest of
            // the plan is discarded and re-derived next round.
            let Some(action) = plan.into_iter().next() else { break };

            let resolved = match validate(&action, perception.bounds) {
                Ok(resolved) => resolved,
                Err(e) => return self.fail(e),
            };
            if let Err(e) = self.hands.execute(&resolved).await {
                return self.fail(e);
            }

            steps_done += 1;
            let _ = self.bridge.send(WorkerMsg::StepExecuted { number: steps_done, action: resolved });
        }
        let _ = self.bridge.send(WorkerMsg::RunFinished { steps_done });
    }

    fn fail(&mut self, error: AgentError) {
        let _ = self.bridge.send(WorkerMsg::Failure { message: error.to_string() });
    }
}

/// The core state machine. Reacts to front-end events and to worker
/// messages drained from the bridge; never blocks on the worker.
pub struct SessionController {
    session: Session,
    jobs: mpsc::UnboundedSender<WorkerJob>,
    updates: broadcast::Sender<UiUpdate>,
}

impl SessionController {
    pub fn new(jobs: mpsc::UnboundedSender<WorkerJob>, updates: broadcast::Sender<UiUpdate>) -> Self {
        Self { session: Session::idle(), jobs, updates }
    }

    pub fn status(&self) -> Status {
        self.session.status
    }

    pub fn steps_completed(&self) -> u32 {
        self.session.steps_completed
    }

    /// Front-end loop: react to UI events as they arrive, drain the bridge
    /// on a fixed tick.
    pub async fn run(mut self, mut ui_rx: mpsc::UnboundedReceiver<UiEvent>, mut bridge: EventBridge) {
        let mut tick = interval(Duration::from_millis(100));
        loop {
            tokio::select! {
                event = ui_rx.recv() => {
                    match event {
                        Some(event) => self.handle_ui(event),
                        None => break, // front end is gone
                    }
                }
                _ = tick.tick() => {
                    for msg in bridge.drain() {
                        self.handle_worker(msg);
                    }
                }
            }
        }
    }

    pub fn handle_ui(&mut self, event: UiEvent) {
        match event {
            UiEvent::Submit { instruction, budget } => self.on_submit(instruction, budget),
            UiEvent::Confirm { accept } => self.on_confirm(accept),
            UiEvent::Acknowledge => self.on_acknowledge(),
        }
    }

    pub fn handle_worker(&mut self, msg: WorkerMsg) {
        match msg {
            WorkerMsg::PlanReady { plan, instruction, budget, perception } => {
                self.on_plan_ready(plan, instruction, budget, perception);
            }
            WorkerMsg::StepExecuted { number, action } => self.on_step(number, &action),
            WorkerMsg::RunFinished { steps_done } => self.on_run_finished(steps_done),
            WorkerMsg::Failure { message } => self.on_failure(message),
        }
    }

    fn on_submit(&mut self, instruction: String, budget: u32) {
        if self.session.status != Status::Idle {
            self.log(format!(
                "busy: a session is already active ({:?})",
                self.session.status
            ));
            return;
        }
        tracing::info!(%instruction, budget, "submission accepted");
        self.log(format!("planning: {instruction}"));
        self.session.status = Status::RequestingPlan;
        let _ = self.jobs.send(WorkerJob::RequestPlan { instruction, budget });
    }

    fn on_confirm(&mut self, accept: bool) {
        if self.session.status != Status::AwaitingConfirmation {
            tracing::warn!(accept, status = ?self.session.status, "confirmation ignored");
            return;
        }
        if accept {
            self.session.status = Status::Iterating;
            self.log(format!(
                "plan confirmed, executing up to {} step(s)",
                self.session.budget
            ));
            let _ = self.jobs.send(WorkerJob::RunSteps {
                instruction: self.session.instruction.clone(),
                budget: self.session.budget,
            });
        } else {
            self.session.status = Status::Aborted;
            self.log("plan declined".to_string());
            let _ = self.updates.send(UiUpdate::Aborted);
        }
    }

    fn on_acknowledge(&mut self) {
        match self.session.status {
            Status::Completed | Status::Failed | Status::Aborted => {
                self.session = Session::idle();
                let _ = self.updates.send(UiUpdate::Ready);
            }
            _ => {}
        }
    }

    fn on_plan_ready(&mut self, plan: Plan, instruction: String, budget: u32, perception: Perception) {
        if self.session.status != Status::RequestingPlan {
            tracing::warn!(status = ?self.session.status, "stray PlanReady dropped");
            return;
        }
        let rendered = serde_json::to_string_pretty(&plan).unwrap_or_else(|_| format!("{plan:?}"));
        self.log(format!(
            "plan received ({} action(s), screen {}x{}):\n{rendered}",
            plan.len(),
            perception.bounds.width,
            perception.bounds.height
        ));
        self.session = Session {
            instruction,
            budget,
            steps_completed: 0,
            status: Status::AwaitingConfirmation,
            last_perception: Some(perception),
        };
        let _ = self.updates.send(UiUpdate::PlanPending { plan: rendered, budget });
    }

    fn on_step(&mut self, number: u32, action: &ResolvedAction) {
        if self.session.status != Status::Iterating {
            return;
        }
        self.session.steps_completed = number;
        let description = format!("{action:?}");
        self.log(format!("[{number}/{}] {description}", self.session.budget));
        let _ = self.updates.send(UiUpdate::Step { number, description });
    }

    fn on_run_finished(&mut self, steps_done: u32) {
        if self.session.status != Status::Iterating {
            return;
        }
        self.session.steps_completed = steps_done;
        self.session.status = Status::Completed;
        tracing::info!(steps_done, "run completed");
        let _ = self.updates.send(UiUpdate::TaskComplete {
            summary: format!("finished after {steps_done} step(s)"),
        });
    }

    fn on_failure(&mut self, message: String) {
        match self.session.status {
            Status::RequestingPlan => {
                // No session was created; surface the error and stay usable.
                tracing::error!(%message, "planning request failed");
                self.session = Session::idle();
                let _ = self.updates.send(UiUpdate::TaskError { message });
                let _ = self.updates.send(UiUpdate::Ready);
            }
            Status::Iterating => {
                tracing::error!(%message, steps = self.session.steps_completed, "run failed");
                self.session.status = Status::Failed;
                let _ = self.updates.send(UiUpdate::TaskError { message });
            }
            _ => {
                tracing::warn!(%message, status = ?self.session.status, "stray failure dropped");
            }
        }
    }

    fn log(&self, line: String) {
        tracing::info!("{line}");
        let _ = self.updates.send(UiUpdate::Log { line });
    }
}
