use std::sync::Arc;

use actix_web::{
    delete, error::JsonPayloadError, get, http::Method, post, put, web, HttpRequest, HttpResponse,
};
use bson::oid::ObjectId;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::auth::{authenticate, TokenKey};
use crate::balance::{compute_group_summary, compute_master_summary, compute_personal_summary};
use crate::error::AppError;
use crate::reports::{expense_details, list_deposits, summarize_events};
use crate::schemas::{DepositRecord, EventId, GroupId, Role, UserId};
use crate::store::{load_ledgers, FinanceStore};

pub struct AppState {
    pub store: Arc<dyn FinanceStore>,
    pub token_key: TokenKey,
}

#[derive(Deserialize)]
struct NewDepositJson {
    user_id: UserId,
    group_id: GroupId,
    amount: Decimal,
}

#[derive(Deserialize)]
struct DepositAmountJson {
    amount: Decimal,
}

const NEW_DEPOSIT_MESSAGE: &str = "User, group, and a valid amount are required.";
const DEPOSIT_AMOUNT_MESSAGE: &str = "A valid positive amount is required.";

fn validate_amount(amount: Decimal, message: &str) -> Result<Decimal, AppError> {
    if amount <= Decimal::ZERO || amount.normalize().scale() > 2 {
        return Err(AppError::BadRequest(message.to_string()));
    }
    Ok(amount)
}

async fn require_admin(
    store: &dyn FinanceStore,
    user_id: UserId,
    group_id: GroupId,
) -> Result<(), AppError> {
    match store.role_in_group(user_id, group_id).await? {
        Some(Role::Admin) => Ok(()),
        _ => Err(AppError::Forbidden("You are not an admin of this group.".to_string())),
    }
}

#[get("/group/{group_id}")]
async fn group_finances(
    request: HttpRequest,
    state: web::Data<AppState>,
    group_id: web::Path<GroupId>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticate(&request, &state.token_key)?;
    let group_id = group_id.into_inner();
    let store = state.store.as_ref();

    let group = store
        .find_group(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found.".to_string()))?;
    require_admin(store, principal.user_id, group_id).await?;

    let ledger = load_ledgers(store, std::slice::from_ref(&group))
        .await?
        .remove(&group_id)
        .unwrap_or_default();
    let summary =
        compute_group_summary(&group, &ledger.members, &ledger.expenses, &ledger.deposits);
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/admin-summary")]
async fn admin_summary(
    request: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticate(&request, &state.token_key)?;
    let store = state.store.as_ref();

    let admin_groups = store.admin_groups(principal.user_id).await?;
    let ledgers = load_ledgers(store, &admin_groups).await?;
    let summary = compute_master_summary(principal.user_id, &admin_groups, &ledgers);
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/my-summary")]
async fn my_summary(
    request: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticate(&request, &state.token_key)?;
    let store = state.store.as_ref();

    let (expenses, deposits) = futures::try_join!(
        store.expenses_for_user(principal.user_id),
        store.deposits_for_user(principal.user_id),
    )?;
    Ok(HttpResponse::Ok().json(compute_personal_summary(
        principal.user_id,
        &expenses,
        &deposits,
    )))
}

#[post("/deposits")]
async fn add_deposit(
    request: HttpRequest,
    state: web::Data<AppState>,
    json: web::Json<NewDepositJson>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticate(&request, &state.token_key)?;
    let store = state.store.as_ref();
    let NewDepositJson {
        user_id,
        group_id,
        amount,
    } = json.into_inner();
    let amount = validate_amount(amount, NEW_DEPOSIT_MESSAGE)?;

    if store.find_group(group_id).await?.is_none() {
        return Err(AppError::NotFound("Group not found.".to_string()));
    }
    require_admin(store, principal.user_id, group_id).await?;
    if store.role_in_group(user_id, group_id).await?.is_none() {
        return Err(AppError::BadRequest("User is not a member of this group.".to_string()));
    }

    let deposit = DepositRecord {
        deposit_id: ObjectId::new().to_hex(),
        user_id,
        group_id,
        amount,
        deposit_timestamp: Utc::now(),
    };
    store.insert_deposit(&deposit).await?;
    info!(
        deposit_id = %deposit.deposit_id,
        user_id,
        group_id,
        %amount,
        admin = principal.user_id,
        "Deposit recorded"
    );
    Ok(HttpResponse::Created().json(json!({
        "message": "Deposit recorded successfully.",
        "deposit_id": deposit.deposit_id,
    })))
}

#[get("/deposits")]
async fn admin_deposits(
    request: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticate(&request, &state.token_key)?;
    let store = state.store.as_ref();

    let admin_groups = store.admin_groups(principal.user_id).await?;
    if admin_groups.is_empty() {
        return Ok(HttpResponse::Ok().json(json!([])));
    }
    let group_ids: Vec<GroupId> = admin_groups.iter().map(|g| g.group_id).collect();
    let deposits = store.deposits_for_groups(&group_ids).await?;
    let mut user_ids: Vec<UserId> = deposits.iter().map(|d| d.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let usernames = store.usernames(&user_ids).await?;

    Ok(HttpResponse::Ok().json(list_deposits(&deposits, &usernames, &admin_groups)))
}

#[put("/deposits/{deposit_id}")]
async fn edit_deposit(
    request: HttpRequest,
    state: web::Data<AppState>,
    deposit_id: web::Path<String>,
    json: web::Json<DepositAmountJson>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticate(&request, &state.token_key)?;
    let store = state.store.as_ref();
    let deposit_id = deposit_id.into_inner();
    let amount = validate_amount(json.into_inner().amount, DEPOSIT_AMOUNT_MESSAGE)?;

    let deposit = store
        .find_deposit(&deposit_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deposit not found.".to_string()))?;
    require_admin(store, principal.user_id, deposit.group_id).await?;

    if !store.update_deposit_amount(&deposit_id, amount).await? {
        return Err(AppError::NotFound("Deposit not found.".to_string()));
    }
    info!(%deposit_id, %amount, admin = principal.user_id, "Deposit updated");
    Ok(HttpResponse::Ok().json(json!({ "message": "Deposit updated successfully." })))
}

#[delete("/deposits/{deposit_id}")]
async fn remove_deposit(
    request: HttpRequest,
    state: web::Data<AppState>,
    deposit_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticate(&request, &state.token_key)?;
    let store = state.store.as_ref();
    let deposit_id = deposit_id.into_inner();

    let deposit = store
        .find_deposit(&deposit_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deposit not found.".to_string()))?;
    require_admin(store, principal.user_id, deposit.group_id).await?;

    if !store.delete_deposit(&deposit_id).await? {
        return Err(AppError::NotFound("Deposit not found.".to_string()));
    }
    info!(%deposit_id, admin = principal.user_id, "Deposit deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Deposit deleted successfully." })))
}

#[get("/admin/event-summary")]
async fn event_summary(
    request: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticate(&request, &state.token_key)?;
    let store = state.store.as_ref();

    let admin_groups = store.admin_groups(principal.user_id).await?;
    if admin_groups.is_empty() {
        return Ok(HttpResponse::Ok().json(json!([])));
    }
    let group_ids: Vec<GroupId> = admin_groups.iter().map(|g| g.group_id).collect();
    let events = store.events_for_groups(&group_ids).await?;
    let event_ids: Vec<EventId> = events.iter().map(|e| e.event_id).collect();
    let expenses = store.expenses_for_events(&event_ids).await?;

    Ok(HttpResponse::Ok().json(summarize_events(&events, &admin_groups, &expenses)))
}

#[get("/event/{event_id}/details")]
async fn event_details(
    request: HttpRequest,
    state: web::Data<AppState>,
    event_id: web::Path<EventId>,
) -> Result<HttpResponse, AppError> {
    let principal = authenticate(&request, &state.token_key)?;
    let store = state.store.as_ref();
    let event_id = event_id.into_inner();

    let event = store
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;
    require_admin(store, principal.user_id, event.group_id).await?;

    let expenses = store.expenses_for_events(&[event_id]).await?;
    let mut user_ids: Vec<UserId> = expenses.iter().map(|e| e.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let usernames = store.usernames(&user_ids).await?;

    Ok(HttpResponse::Ok().json(expense_details(event_id, &expenses, &usernames)))
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Malformed deposit bodies get the same `{message}` answer as invalid amounts.
fn json_error(err: JsonPayloadError, request: &HttpRequest) -> actix_web::Error {
    debug!(path = %request.path(), "Rejected request body: {}", err);
    let message = if request.method() == Method::PUT {
        DEPOSIT_AMOUNT_MESSAGE
    } else {
        NEW_DEPOSIT_MESSAGE
    };
    AppError::BadRequest(message.to_string()).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::scope("/api/finances")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .service(group_finances)
            .service(admin_summary)
            .service(my_summary)
            .service(add_deposit)
            .service(admin_deposits)
            .service(edit_deposit)
            .service(remove_deposit)
            .service(event_summary)
            .service(event_details),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;
    use crate::schemas::{EventRecord, ExpenseRecord, Group, Membership, User};
    use crate::store::{MemoryData, MemoryStore};
    use actix_web::{http::StatusCode, test, App};
    use chrono::{DateTime, Duration};
    use serde_json::Value;

    const ADMIN: UserId = 1;
    const MEMBER: UserId = 2;
    const OTHER_MEMBER: UserId = 3;
    const OUTSIDER: UserId = 5;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_720_000_000 + secs, 0).unwrap()
    }

    fn expense(expense_id: i64, user_id: UserId, event_id: EventId, cost: i64) -> ExpenseRecord {
        ExpenseRecord {
            expense_id,
            user_id,
            event_id,
            quantity: 1,
            total_cost: Decimal::from(cost),
            expense_timestamp: at(expense_id),
        }
    }

    fn deposit(id: &str, user_id: UserId, group_id: GroupId, amount: i64) -> DepositRecord {
        DepositRecord {
            deposit_id: id.to_string(),
            user_id,
            group_id,
            amount: Decimal::from(amount),
            deposit_timestamp: at(0),
        }
    }

    /// Alps (10) spends 350 against 500 deposited, Baltic (20) spends 1000
    /// against 800. The admin runs both.
    fn data() -> MemoryData {
        let membership = |user_id, group_id, role| Membership {
            user_id,
            group_id,
            role,
        };
        MemoryData {
            users: [(ADMIN, "ana"), (MEMBER, "ben"), (OTHER_MEMBER, "cy"), (OUTSIDER, "dee")]
                .into_iter()
                .map(|(user_id, name)| User {
                    user_id,
                    username: name.to_string(),
                })
                .collect(),
            groups: vec![
                Group {
                    group_id: 10,
                    group_name: "Alps".to_string(),
                },
                Group {
                    group_id: 20,
                    group_name: "Baltic".to_string(),
                },
            ],
            memberships: vec![
                membership(ADMIN, 10, Role::Admin),
                membership(MEMBER, 10, Role::Member),
                membership(ADMIN, 20, Role::Admin),
                membership(OTHER_MEMBER, 20, Role::Member),
            ],
            events: vec![
                EventRecord {
                    event_id: 100,
                    event_name: "Museum".to_string(),
                    location_name: "Innsbruck".to_string(),
                    group_id: 10,
                },
                EventRecord {
                    event_id: 200,
                    event_name: "Ferry".to_string(),
                    location_name: "Tallinn".to_string(),
                    group_id: 20,
                },
            ],
            expenses: vec![
                expense(1, ADMIN, 100, 100),
                expense(2, ADMIN, 100, 200),
                expense(3, MEMBER, 100, 50),
                expense(4, OTHER_MEMBER, 200, 600),
                expense(5, ADMIN, 200, 400),
            ],
            deposits: vec![
                deposit("d1", ADMIN, 10, 500),
                deposit("d2", OTHER_MEMBER, 20, 800),
            ],
        }
    }

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState {
            store: Arc::new(MemoryStore::new(data())),
            token_key: TokenKey::new("route-tests"),
        })
    }

    fn bearer(state: &AppState, user_id: UserId) -> (&'static str, String) {
        let token = issue_token(&state.token_key, user_id, Utc::now() + Duration::hours(1));
        ("Authorization", format!("Bearer {}", token))
    }

    fn number(value: &Value) -> f64 {
        value.as_f64().unwrap()
    }

    #[actix_web::test]
    async fn group_summary_for_admin() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::get()
            .uri("/api/finances/group/10")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(body["group_name"], "Alps");
        assert_eq!(number(&body["groupSummary"]["total_spent"]), 350.0);
        assert_eq!(number(&body["groupSummary"]["total_deposited"]), 500.0);
        assert_eq!(number(&body["groupSummary"]["balance"]), 150.0);

        let users = body["userSummaries"].as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0]["username"], "ana");
        assert_eq!(users[0]["role"], "admin");
        assert_eq!(number(&users[0]["balance"]), 200.0);
        assert_eq!(number(&users[1]["balance"]), -50.0);
    }

    #[actix_web::test]
    async fn group_summary_access_errors() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::get()
            .uri("/api/finances/group/10")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = test::TestRequest::get()
            .uri("/api/finances/group/10")
            .insert_header(bearer(&state, MEMBER))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = test::TestRequest::get()
            .uri("/api/finances/group/99")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["message"], "Group not found.");
    }

    #[actix_web::test]
    async fn master_summary_across_admin_groups() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::get()
            .uri("/api/finances/admin-summary")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(number(&body["masterSummary"]["total_spent"]), 1350.0);
        assert_eq!(number(&body["masterSummary"]["total_deposited"]), 1300.0);
        assert_eq!(number(&body["masterSummary"]["balance"]), -50.0);

        let groups = body["groupSummaries"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1]["group_name"], "Baltic");
        assert_eq!(number(&groups[1]["groupSummary"]["balance"]), -200.0);
    }

    #[actix_web::test]
    async fn master_summary_without_admin_groups_is_zero() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::get()
            .uri("/api/finances/admin-summary")
            .insert_header(bearer(&state, OUTSIDER))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(number(&body["masterSummary"]["total_spent"]), 0.0);
        assert_eq!(number(&body["masterSummary"]["total_deposited"]), 0.0);
        assert_eq!(number(&body["masterSummary"]["balance"]), 0.0);
        assert_eq!(body["groupSummaries"], serde_json::json!([]));
    }

    #[actix_web::test]
    async fn personal_summary() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::get()
            .uri("/api/finances/my-summary")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(number(&body["total_spent"]), 700.0);
        assert_eq!(number(&body["total_deposited"]), 500.0);
        assert_eq!(number(&body["balance"]), -200.0);
    }

    #[actix_web::test]
    async fn recorded_deposit_shows_up_in_group_summary() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::post()
            .uri("/api/finances/deposits")
            .insert_header(bearer(&state, ADMIN))
            .set_json(serde_json::json!({ "user_id": MEMBER, "group_id": 10, "amount": 25.5 }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = test::TestRequest::get()
            .uri("/api/finances/group/10")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(number(&body["userSummaries"][1]["total_deposited"]), 25.5);
        assert_eq!(number(&body["userSummaries"][1]["balance"]), -24.5);
        assert_eq!(number(&body["groupSummary"]["total_deposited"]), 525.5);
    }

    #[actix_web::test]
    async fn deposit_write_path_rejections() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let payload = |user_id: UserId, group_id: GroupId, amount: Value| {
            serde_json::json!({ "user_id": user_id, "group_id": group_id, "amount": amount })
        };
        let cases = [
            (ADMIN, payload(MEMBER, 10, (-5).into()), StatusCode::BAD_REQUEST),
            (ADMIN, payload(MEMBER, 10, 0.into()), StatusCode::BAD_REQUEST),
            (ADMIN, payload(MEMBER, 10, 1.005.into()), StatusCode::BAD_REQUEST),
            (ADMIN, payload(OUTSIDER, 10, 5.into()), StatusCode::BAD_REQUEST),
            (ADMIN, payload(MEMBER, 99, 5.into()), StatusCode::NOT_FOUND),
            (MEMBER, payload(MEMBER, 10, 5.into()), StatusCode::FORBIDDEN),
        ];
        for (principal, payload, expected) in cases {
            let request = test::TestRequest::post()
                .uri("/api/finances/deposits")
                .insert_header(bearer(&state, principal))
                .set_json(&payload)
                .to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), expected, "{}", payload);
        }
    }

    #[actix_web::test]
    async fn malformed_deposit_bodies_answer_with_json_message() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let bodies = [
            serde_json::json!({ "user_id": MEMBER, "group_id": 10 }),
            serde_json::json!({ "user_id": MEMBER, "group_id": 10, "amount": "lots" }),
        ];
        for body in bodies {
            let request = test::TestRequest::post()
                .uri("/api/finances/deposits")
                .insert_header(bearer(&state, ADMIN))
                .set_json(&body)
                .to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
            let value: Value = test::read_body_json(response).await;
            assert_eq!(value["message"], NEW_DEPOSIT_MESSAGE);
        }

        let request = test::TestRequest::put()
            .uri("/api/finances/deposits/d1")
            .insert_header(bearer(&state, ADMIN))
            .set_json(serde_json::json!({}))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = test::read_body_json(response).await;
        assert_eq!(value["message"], DEPOSIT_AMOUNT_MESSAGE);
    }

    #[actix_web::test]
    async fn edit_and_delete_deposit() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::put()
            .uri("/api/finances/deposits/d2")
            .insert_header(bearer(&state, MEMBER))
            .set_json(serde_json::json!({ "amount": 10 }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::FORBIDDEN);

        let request = test::TestRequest::put()
            .uri("/api/finances/deposits/d2")
            .insert_header(bearer(&state, ADMIN))
            .set_json(serde_json::json!({ "amount": 1000 }))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

        let request = test::TestRequest::delete()
            .uri("/api/finances/deposits/d1")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

        let request = test::TestRequest::delete()
            .uri("/api/finances/deposits/d1")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::NOT_FOUND);

        let request = test::TestRequest::get()
            .uri("/api/finances/admin-summary")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(number(&body["masterSummary"]["total_deposited"]), 1000.0);
        assert_eq!(number(&body["masterSummary"]["balance"]), -350.0);
    }

    #[actix_web::test]
    async fn deposit_listing_for_admin() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::get()
            .uri("/api/finances/deposits")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        let deposits = body.as_array().unwrap();
        assert_eq!(deposits.len(), 2);
        assert!(deposits
            .iter()
            .any(|d| d["username"] == "cy" && d["group_name"] == "Baltic"));

        let request = test::TestRequest::get()
            .uri("/api/finances/deposits")
            .insert_header(bearer(&state, MEMBER))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, serde_json::json!([]));
    }

    #[actix_web::test]
    async fn event_reports() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::get()
            .uri("/api/finances/admin/event-summary")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        let events = body.as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event_name"], "Ferry");
        assert_eq!(number(&events[0]["total_expense"]), 1000.0);
        assert_eq!(events[1]["total_quantity"], 3);

        let request = test::TestRequest::get()
            .uri("/api/finances/event/100/details")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        let details = body.as_array().unwrap();
        assert_eq!(details.len(), 3);
        assert_eq!(details[0]["username"], "ben");

        let request = test::TestRequest::get()
            .uri("/api/finances/event/100/details")
            .insert_header(bearer(&state, OTHER_MEMBER))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::FORBIDDEN);

        let request = test::TestRequest::get()
            .uri("/api/finances/event/404/details")
            .insert_header(bearer(&state, ADMIN))
            .to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn health_needs_no_token() {
        let app = test::init_service(App::new().configure(configure)).await;
        let request = test::TestRequest::get().uri("/health").to_request();
        assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);
    }
}
