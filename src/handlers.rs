use crate::models::{NotificationsQuery, NotificationsResponse, WalkResponse, WalkSnapshot};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Json,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let tracker = state.tracker.lock().await;
    Html(render_index(&WalkSnapshot::of(&tracker)))
}

pub async fn get_today(State(state): State<AppState>) -> Json<WalkSnapshot> {
    let tracker = state.tracker.lock().await;
    Json(WalkSnapshot::of(&tracker))
}

pub async fn complete_walk(State(state): State<AppState>) -> Json<WalkResponse> {
    Json(apply_walk(&state).await)
}

pub async fn complete_walk_form(State(state): State<AppState>) -> Redirect {
    apply_walk(&state).await;
    Redirect::to("/")
}

pub async fn get_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        notifications: state.notifications.since(query.after),
    })
}

async fn apply_walk(state: &AppState) -> WalkResponse {
    let mut tracker = state.tracker.lock().await;
    let event = tracker.complete_walk();

    WalkResponse {
        today: WalkSnapshot::of(&tracker),
        accepted: event.is_some(),
        notification: event.map(|event| event.notification()),
    }
}
