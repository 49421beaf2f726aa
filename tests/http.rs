use chrono::{Duration as DayOffset, Local};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct WalkSnapshot {
    date: String,
    count: u32,
    cap: u32,
    progress_percent: u32,
    complete: bool,
    last_walk_time: Option<String>,
    next_reset_in: String,
}

#[derive(Debug, Deserialize)]
struct Notification {
    id: u64,
    title: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct WalkResponse {
    today: WalkSnapshot,
    accepted: bool,
    notification: Option<Notification>,
}

#[derive(Debug, Deserialize)]
struct NotificationsResponse {
    notifications: Vec<Notification>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("walk_tracker_http_{}_{}.json", std::process::id(), nanos));
    path
}

fn seed(path: &Path, date: &str, count: u32) {
    let payload = serde_json::json!({
        "walk_progress": count.to_string(),
        "walk_date": date,
        "last_walk_time": "07:30:00",
    });
    std::fs::write(path, serde_json::to_vec(&payload).unwrap()).unwrap();
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/today")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

/// Writes land from a background task, so poll the data file until `ready`.
async fn wait_for_stored(
    path: &Path,
    ready: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(bytes) = tokio::fs::read(path).await {
            if let Ok(stored) = serde_json::from_slice::<serde_json::Value>(&bytes) {
                if ready(&stored) {
                    return stored;
                }
            }
        }
        if Instant::now() > deadline {
            panic!("data file was not rewritten");
        }
        sleep(Duration::from_millis(50)).await;
    }
}

async fn spawn_server(data_path: PathBuf) -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_walk_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = spawn_server(unique_data_path()).await;
    #[cfg(unix)]
    cleanup::register(server.child.id());
    let server = Arc::new(server);
    *guard = Some(Arc::clone(&server));
    server
}

async fn today(client: &Client, base_url: &str) -> WalkSnapshot {
    client
        .get(format!("{base_url}/api/today"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn notifications(client: &Client, base_url: &str) -> Vec<Notification> {
    let body: NotificationsResponse = client
        .get(format!("{base_url}/api/notifications?after=0"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body.notifications
}

#[tokio::test]
async fn http_walks_stop_at_the_daily_cap() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = today(&client, &server.base_url).await;
    assert_eq!(before.cap, 3);
    assert!(!before.next_reset_in.is_empty());

    let mut responses = Vec::new();
    for _ in 0..=before.cap {
        let response = client
            .post(format!("{}/api/walk", server.base_url))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        responses.push(response.json::<WalkResponse>().await.unwrap());
    }

    let last = responses.last().unwrap();
    assert!(!last.accepted);
    assert!(last.notification.is_none());
    assert_eq!(last.today.count, last.today.cap);
    assert!(last.today.complete);
    assert_eq!(last.today.progress_percent, 100);
    assert!(last.today.last_walk_time.is_some());

    let titles: Vec<String> = notifications(&client, &server.base_url)
        .await
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles.iter().filter(|t| t.contains("Daily Goal Achieved")).count(), 1);

    let after = today(&client, &server.base_url).await;
    assert_eq!(after.count, after.cap);
    assert_eq!(after.date, before.date);
}

#[tokio::test]
async fn http_index_renders_tracker() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client.get(format!("{}/", server.base_url)).send().await.unwrap();
    assert!(response.status().is_success());
    let html = response.text().await.unwrap();
    assert!(html.contains("Daily Walk Tracker"));
    assert!(html.contains("Next reset in"));
}

#[tokio::test]
async fn http_fresh_start_announces_new_day() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let first = notifications(&client, &server.base_url).await;
    let reset = first.first().expect("startup notification");
    assert_eq!(reset.id, 1);
    assert_eq!(reset.title, "🌅 New Day Started!");
    assert_eq!(reset.description, "Walk tracker has been reset for today");
}

#[tokio::test]
async fn http_resumes_todays_progress() {
    let path = unique_data_path();
    seed(&path, &Local::now().date_naive().format("%Y-%m-%d").to_string(), 2);
    let server = spawn_server(path.clone()).await;
    let client = Client::new();

    let snapshot = today(&client, &server.base_url).await;
    assert_eq!(snapshot.count, 2);
    assert_eq!(snapshot.last_walk_time.as_deref(), Some("07:30:00"));
    assert!(notifications(&client, &server.base_url).await.is_empty());

    let response: WalkResponse = client
        .post(format!("{}/api/walk", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(response.accepted);
    assert_eq!(
        response.notification.map(|n| n.title).as_deref(),
        Some("🎉 Daily Goal Achieved!")
    );

    drop(server);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn http_resets_yesterdays_progress() {
    let path = unique_data_path();
    let yesterday = Local::now().date_naive() - DayOffset::days(1);
    seed(&path, &yesterday.format("%Y-%m-%d").to_string(), 2);
    let server = spawn_server(path.clone()).await;
    let client = Client::new();

    let snapshot = today(&client, &server.base_url).await;
    assert_eq!(snapshot.count, 0);
    assert_eq!(snapshot.last_walk_time, None);
    let titles: Vec<String> = notifications(&client, &server.base_url)
        .await
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(titles, vec!["🌅 New Day Started!".to_string()]);

    let stored = wait_for_stored(&path, |stored| stored["walk_progress"] == "0").await;
    assert_eq!(stored["walk_date"], Local::now().date_naive().format("%Y-%m-%d").to_string());
    assert!(stored.get("last_walk_time").is_none());

    drop(server);
    let _ = std::fs::remove_file(path);
}
