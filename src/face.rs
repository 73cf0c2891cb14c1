use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::session::{UiEvent, UiUpdate};

#[derive(Clone)]
pub struct AppState {
    pub ui_tx: mpsc::UnboundedSender<UiEvent>,
    pub update_tx: broadcast::Sender<UiUpdate>,
}

#[derive(Deserialize)]
struct CommandPayload {
    instruction: String,
    max_steps: u32,
}

#[derive(Deserialize)]
struct ConfirmPayload {
    accept: bool,
}

fn to_sse_event(update: &UiUpdate) -> Event {
    match update {
        UiUpdate::Log { line } => Event::default()
            .event("log")
            .data(json!({ "line": line }).to_string()),
        UiUpdate::PlanPending { plan, budget } => Event::default()
            .event("plan_pending")
            .data(json!({ "plan": plan, "budget": budget }).to_string()),
        UiUpdate::Step { number, description } => Event::default()
            .event("step")
            .data(json!({ "number": number, "description": description }).to_string()),
        UiUpdate::TaskComplete { summary } => Event::default()
            .event("task_complete")
            .data(json!({ "summary": summary }).to_string()),
        UiUpdate::TaskError { message } => Event::default()
            .event("task_error")
            .data(json!({ "message": message }).to_string()),
        UiUpdate::Aborted => Event::default().event("aborted").data("{}"),
        UiUpdate::Ready => Event::default().event("ready").data("{}"),
    }
}

/// Start the web UI. Returns the front-end event receiver and the update
/// sender the controller publishes to.
pub async fn start_server(
    port: u16,
) -> anyhow::Result<(mpsc::UnboundedReceiver<UiEvent>, broadcast::Sender<UiUpdate>)> {
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let (update_tx, _) = broadcast::channel(256);

    let state = Arc::new(AppState { ui_tx, update_tx: update_tx.clone() });

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/command", post(command_handler))
        .route("/confirm", post(confirm_handler))
        .route("/ack", post(ack_handler))
        .route("/events", get(sse_handler))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .with_state(state);

    // Try the requested port first, then the next few above it.
    let mut bound = None;
    for p in port..port.saturating_add(10) {
        match tokio::net::TcpListener::bind(format!("127.0.0.1:{p}")).await {
            Ok(listener) => {
                bound = Some((listener, p));
                break;
            }
            Err(_) => continue,
        }
    }
    let Some((listener, port)) = bound else {
        anyhow::bail!("could not bind any port in {port}..{}", port.saturating_add(10));
    };

    tracing::info!("web UI running at http://localhost:{port}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("web server stopped: {e}");
        }
    });

    Ok((ui_rx, update_tx))
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn command_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CommandPayload>,
) -> StatusCode {
    let instruction = payload.instruction.trim().to_string();
    if instruction.is_empty() || payload.max_steps < 1 {
        return StatusCode::BAD_REQUEST;
    }
    tracing::debug!(%instruction, max_steps = payload.max_steps, "submit received");
    let _ = state.ui_tx.send(UiEvent::Submit { instruction, budget: payload.max_steps });
    StatusCode::OK
}

async fn confirm_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmPayload>,
) -> StatusCode {
    let _ = state.ui_tx.send(UiEvent::Confirm { accept: payload.accept });
    StatusCode::OK
}

async fn ack_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let _ = state.ui_tx.send(UiEvent::Acknowledge);
    StatusCode::OK
}

async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.update_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result: Result<UiUpdate, _>| match result {
        Ok(update) => Some(Ok::<_, Infallible>(to_sse_event(&update))),
        Err(_) => None,
    });
    Sse::new(stream)
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>AI Desktop Agent</title>
<style>
  * { margin: 0; padding: 0; box-sizing: border-box; }
  body {
    background: #0b0e14;
    color: #d8dee9;
    font-family: 'Segoe UI', system-ui, -apple-system, sans-serif;
    height: 100vh;
    display: flex;
    flex-direction: column;
  }
  header {
    padding: 18px 28px;
    border-bottom: 1px solid #16202e;
    display: flex;
    align-items: center;
    gap: 10px;
  }
  header h1 { font-size: 18px; font-weight: 600; color: #fff; }
  .dot { width: 8px; height: 8px; border-radius: 50%; background: #34d399; }
  .dot.busy { background: #fbbf24; }
  .main {
    flex: 1; display: flex; flex-direction: column;
    max-width: 820px; width: 100%; margin: 0 auto;
    padding: 20px 28px; gap: 12px; overflow: hidden;
  }
  #log { flex: 1; overflow-y: auto; display: flex; flex-direction: column; gap: 6px; }
  .entry {
    padding: 8px 12px; border-radius: 6px; font-size: 13px; line-height: 1.5;
    font-family: 'Cascadia Code', 'Fira Code', monospace;
    background: #10141d; border-left: 3px solid #2b3648;
    white-space: pre-wrap; word-break: break-word;
  }
  .entry.step { border-left-color: #60a5fa; }
  .entry.error { border-left-color: #f87171; color: #fca5a5; }
  .entry.done { border-left-color: #34d399; color: #a7f3d0; }
  #confirm-bar {
    display: none; flex-direction: column; gap: 8px;
    background: #131a26; border: 1px solid #273246;
    border-radius: 8px; padding: 12px;
  }
  #confirm-bar.visible { display: flex; }
  #confirm-plan {
    max-height: 180px; overflow-y: auto; font-size: 12px;
    font-family: monospace; white-space: pre; color: #9fb4d0;
  }
  #confirm-buttons { display: flex; gap: 8px; }
  .input-area { display: flex; gap: 8px; }
  input[type=text] {
    flex: 1; background: #10141d; border: 1px solid #273246; border-radius: 6px;
    padding: 10px 14px; color: #fff; font-size: 15px; outline: none;
  }
  input[type=number] {
    width: 70px; background: #10141d; border: 1px solid #273246; border-radius: 6px;
    padding: 10px; color: #fff; font-size: 15px; outline: none;
  }
  input:disabled { opacity: 0.5; }
  button {
    background: #3b82f6; color: #fff; border: none; border-radius: 6px;
    padding: 10px 18px; font-size: 14px; font-weight: 600; cursor: pointer;
  }
  button.secondary { background: #374151; }
  button:disabled { background: #273246; cursor: not-allowed; }
</style>
</head>
<body>
  <header>
    <div class="dot" id="status-dot"></div>
    <h1>AI Desktop Agent</h1>
  </header>
  <div class="main">
    <div id="log"></div>
    <div id="confirm-bar">
      <strong>Proposed plan &mdash; run it?</strong>
      <div id="confirm-plan"></div>
      <div id="confirm-buttons">
        <button onclick="confirmPlan(true)">Run</button>
        <button class="secondary" onclick="confirmPlan(false)">Cancel</button>
      </div>
    </div>
    <div class="input-area">
      <input type="text" id="cmd" placeholder="Tell the agent what to do..." autofocus />
      <input type="number" id="steps" value="5" min="1" title="Max steps" />
      <button id="send" onclick="send()">Send</button>
    </div>
  </div>
<script>
  const log = document.getElementById('log');
  const cmd = document.getElementById('cmd');
  const steps = document.getElementById('steps');
  const sendBtn = document.getElementById('send');
  const dot = document.getElementById('status-dot');
  const confirmBar = document.getElementById('confirm-bar');
  const confirmPlanEl = document.getElementById('confirm-plan');
  let busy = false;

  function addEntry(cls, text) {
    const div = document.createElement('div');
    div.className = 'entry ' + cls;
    div.textContent = text;
    log.appendChild(div);
    log.scrollTop = log.scrollHeight;
  }

  function setBusy(b) {
    busy = b;
    cmd.disabled = b;
    steps.disabled = b;
    sendBtn.disabled = b;
    dot.className = b ? 'dot busy' : 'dot';
    if (!b) cmd.focus();
  }

  async function send() {
    const text = cmd.value.trim();
    const max = parseInt(steps.value, 10);
    if (!text || busy) return;
    if (!Number.isInteger(max) || max < 1) {
      addEntry('error', 'Max steps must be an integer >= 1.');
      return;
    }
    cmd.value = '';
    addEntry('', 'You: ' + text);
    setBusy(true);
    await fetch('/command', {
      method: 'POST',
      headers: {'Content-Type': 'application/json'},
      body: JSON.stringify({instruction: text, max_steps: max}),
    });
  }

  async function confirmPlan(accept) {
    confirmBar.className = '';
    await fetch('/confirm', {
      method: 'POST',
      headers: {'Content-Type': 'application/json'},
      body: JSON.stringify({accept}),
    });
  }

  function acknowledge() {
    fetch('/ack', {method: 'POST'});
  }

  cmd.addEventListener('keydown', e => { if (e.key === 'Enter') send(); });

  const es = new EventSource('/events');

  es.addEventListener('log', e => {
    addEntry('', JSON.parse(e.data).line);
  });

  es.addEventListener('plan_pending', e => {
    const d = JSON.parse(e.data);
    confirmPlanEl.textContent = d.plan;
    confirmBar.className = 'visible';
  });

  es.addEventListener('step', e => {
    const d = JSON.parse(e.data);
    addEntry('step', 'Step ' + d.number + ': ' + d.description);
  });

  es.addEventListener('task_complete', e => {
    addEntry('done', 'Done: ' + JSON.parse(e.data).summary);
    acknowledge();
  });

  es.addEventListener('task_error', e => {
    addEntry('error', 'Error: ' + JSON.parse(e.data).message);
    acknowledge();
  });

  es.addEventListener('aborted', () => {
    addEntry('error', 'Plan declined; nothing was executed.');
    acknowledge();
  });

  es.addEventListener('ready', () => setBusy(false));

  addEntry('done', 'Agent ready. Type an instruction to begin.');
</script>
</body>
</html>
"##;
