use crate::models::WalkSnapshot;

pub fn render_index(snapshot: &WalkSnapshot) -> String {
    let last_walk = snapshot.last_walk_time.as_deref().unwrap_or("");
    let button_label = if snapshot.complete {
        "Daily Goal Complete!"
    } else {
        "Complete Walk"
    };

    INDEX_HTML
        .replace("{{DATE}}", &escape(&snapshot.date))
        .replace("{{COUNT}}", &snapshot.count.to_string())
        .replace("{{CAP}}", &snapshot.cap.to_string())
        .replace("{{PERCENT}}", &snapshot.progress_percent.to_string())
        .replace("{{LAST_WALK}}", &escape(last_walk))
        .replace("{{LAST_WALK_HIDDEN}}", if last_walk.is_empty() { "hidden" } else { "" })
        .replace("{{NEXT_RESET}}", &escape(&snapshot.next_reset_in))
        .replace("{{BUTTON_LABEL}}", button_label)
        .replace("{{DISABLED}}", if snapshot.complete { "disabled" } else { "" })
        .replace("{{DONE_HIDDEN}}", if snapshot.complete { "" } else { "hidden" })
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Daily Walk Tracker</title>
  <style>
    :root {
      --bg-1: #eef6f0;
      --bg-2: #bfe3cf;
      --ink: #22302a;
      --accent: #2f9e6b;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e3f1e8 60%, #f4f9f6 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(520px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Georgia", serif;
      font-size: clamp(1.8rem, 4vw, 2.4rem);
      margin: 0;
    }

    .count {
      text-align: center;
      font-size: 2.8rem;
      font-weight: 700;
      color: var(--accent);
    }

    .muted {
      margin: 0;
      text-align: center;
      color: #6b645d;
    }

    .progress-row {
      display: flex;
      justify-content: space-between;
      font-size: 0.9rem;
    }

    .bar {
      height: 12px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.1);
      overflow: hidden;
    }

    .bar-fill {
      height: 100%;
      background: var(--accent);
      transition: width 300ms ease;
    }

    .meta {
      display: flex;
      justify-content: space-between;
      font-size: 0.85rem;
      color: #6b645d;
      padding: 8px 12px;
      background: rgba(47, 72, 88, 0.06);
      border-radius: 12px;
    }

    button {
      width: 100%;
      border: none;
      border-radius: 999px;
      padding: 16px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
      box-shadow: 0 10px 24px rgba(47, 158, 107, 0.3);
    }

    button:disabled {
      cursor: default;
      opacity: 0.6;
      box-shadow: none;
    }

    .done {
      text-align: center;
      padding: 14px;
      border-radius: 14px;
      background: #e6f6ec;
      border: 1px solid #b5e2c6;
      color: #1f6b43;
      font-weight: 600;
    }

    .toasts {
      position: fixed;
      right: 18px;
      bottom: 18px;
      display: grid;
      gap: 10px;
    }

    .toast {
      background: white;
      border-radius: 14px;
      padding: 12px 16px;
      box-shadow: var(--shadow);
      max-width: 320px;
    }

    .toast strong {
      display: block;
    }

    [hidden] {
      display: none !important;
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Daily Walk Tracker</h1>

    <div>
      <div class="count"><span id="count">{{COUNT}}</span>/<span id="cap">{{CAP}}</span></div>
      <p class="muted">Walks completed today (<span id="date">{{DATE}}</span>)</p>
    </div>

    <div>
      <div class="progress-row">
        <span>Progress</span>
        <span><span id="percent">{{PERCENT}}</span>%</span>
      </div>
      <div class="bar"><div id="bar-fill" class="bar-fill" style="width: {{PERCENT}}%"></div></div>
    </div>

    <p id="last-walk-row" class="muted" {{LAST_WALK_HIDDEN}}>Last walk: <span id="last-walk">{{LAST_WALK}}</span></p>

    <div class="meta">
      <span>Next reset in: <span id="next-reset">{{NEXT_RESET}}</span></span>
      <span>00:00</span>
    </div>

    <form id="walk-form" method="post" action="/walk">
      <button id="walk-btn" type="submit" {{DISABLED}}>{{BUTTON_LABEL}}</button>
    </form>

    <div id="done" class="done" {{DONE_HIDDEN}}>Excellent! Your dog got all the exercise needed today!</div>
  </main>

  <div id="toasts" class="toasts"></div>

  <script>
    let lastNotification = 0;

    const updateUI = (today) => {
      document.getElementById('count').textContent = today.count;
      document.getElementById('cap').textContent = today.cap;
      document.getElementById('date').textContent = today.date;
      document.getElementById('percent').textContent = today.progress_percent;
      document.getElementById('bar-fill').style.width = `${today.progress_percent}%`;
      document.getElementById('next-reset').textContent = today.next_reset_in;

      const lastRow = document.getElementById('last-walk-row');
      lastRow.hidden = !today.last_walk_time;
      document.getElementById('last-walk').textContent = today.last_walk_time || '';

      const button = document.getElementById('walk-btn');
      button.disabled = today.complete;
      button.textContent = today.complete ? 'Daily Goal Complete!' : 'Complete Walk';
      document.getElementById('done').hidden = !today.complete;
    };

    const showToast = ({ title, description }) => {
      const toast = document.createElement('div');
      toast.className = 'toast';
      const heading = document.createElement('strong');
      heading.textContent = title;
      const body = document.createElement('span');
      body.textContent = description;
      toast.append(heading, body);
      document.getElementById('toasts').append(toast);
      setTimeout(() => toast.remove(), 4000);
    };

    const loadToday = async () => {
      const res = await fetch('/api/today');
      if (!res.ok) {
        throw new Error('Unable to load today');
      }
      updateUI(await res.json());
    };

    const loadNotifications = async (show) => {
      const res = await fetch(`/api/notifications?after=${lastNotification}`);
      if (!res.ok) {
        return;
      }
      const { notifications } = await res.json();
      for (const item of notifications) {
        lastNotification = Math.max(lastNotification, item.id);
        if (show) {
          showToast(item);
        }
      }
    };

    document.getElementById('walk-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const res = await fetch('/api/walk', { method: 'POST' });
      if (res.ok) {
        const body = await res.json();
        updateUI(body.today);
        await loadNotifications(true);
      }
    });

    loadNotifications(false).catch(() => {});
    setInterval(() => {
      loadToday().catch(() => {});
      loadNotifications(true).catch(() => {});
    }, 10000);
  </script>
</body>
</html>
"#;
