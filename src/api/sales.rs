use crate::{
    auth::auth::AuthUser,
    ingest,
    model::sales_item::{NewSalesItem, SalesItem},
};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, web};
use futures_util::TryStreamExt;
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::ToSchema;

const INSERT_SALES_ITEM: &str = r#"
    INSERT INTO sales_items
    (date, order_number, item_name, selling_price, quantity, buying_price, payment_mode, profit, revenue)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// List sales items
#[utoipa::path(
    get,
    path = "/api/sales",
    responses(
        (status = 200, description = "All sales items, unpaginated", body = [SalesItem])
    ),
    tag = "Sales",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_sales(pool: web::Data<MySqlPool>) -> impl Responder {
    let rows = sqlx::query_as::<_, SalesItem>("SELECT * FROM sales_items")
        .fetch_all(pool.get_ref())
        .await;

    match rows {
        Ok(items) => {
            debug!(count = items.len(), "Fetched sales items");
            HttpResponse::Ok().json(items)
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch sales items");
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to fetch sales items"
            }))
        }
    }
}

/// Create a sales item
#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = NewSalesItem,
    responses(
        (status = 201, description = "Created sales item with computed revenue and profit", body = SalesItem),
        (status = 403, description = "Requires manager role"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Sales",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_sale(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewSalesItem>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let item = payload.into_inner();

    let result = sqlx::query(INSERT_SALES_ITEM)
        .bind(item.date)
        .bind(&item.order_number)
        .bind(&item.item_name)
        .bind(item.selling_price)
        .bind(item.quantity)
        .bind(item.buying_price)
        .bind(&item.payment_mode)
        .bind(item.profit())
        .bind(item.revenue())
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            let id = res.last_insert_id();
            info!(id, "Added sales item");
            Ok(HttpResponse::Created().json(SalesItem {
                id,
                date: item.date,
                order_number: item.order_number.clone(),
                item_name: item.item_name.clone(),
                selling_price: item.selling_price,
                quantity: item.quantity,
                buying_price: item.buying_price,
                payment_mode: item.payment_mode.clone(),
                profit: item.profit(),
                revenue: item.revenue(),
            }))
        }
        Err(e) => {
            error!(error = %e, "Failed to add sales item");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to add sales item"
            })))
        }
    }
}

/// Delete a sales item
#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    params(
        ("id", Path, description = "Sales item ID")
    ),
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({"success": true})),
        (status = 403, description = "Requires manager role"),
        (status = 404, description = "Sales item not found")
    ),
    tag = "Sales",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_sale(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM sales_items WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "error": "Sales item not found"
                })));
            }

            info!(id, "Deleted sales item");
            Ok(HttpResponse::Ok().json(json!({ "success": true })))
        }
        Err(e) => {
            error!(error = %e, id, "Failed to delete sales item");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to delete sales item"
            })))
        }
    }
}

/// Drains the first file field of a multipart request into memory.
async fn read_upload(payload: &mut Multipart) -> Result<Option<Vec<u8>>, actix_web::Error> {
    let mut field = match payload.try_next().await? {
        Some(f) => f,
        None => return Ok(None),
    };

    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        data.extend_from_slice(&chunk);
    }

    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(data))
}

/// Upload a spreadsheet of sales items
///
/// Validates the whole sheet up front and inserts every row in one
/// transaction: either all rows land or none do.
#[utoipa::path(
    post,
    path = "/api/sales/upload",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "All rows inserted", body = [SalesItem]),
        (status = 400, description = "Validation failure naming the offending column or row"),
        (status = 403, description = "Requires manager role"),
        (status = 500, description = "Bulk insert failed; batch rolled back")
    ),
    tag = "Sales",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_sales(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    mut payload: Multipart,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let bytes = match read_upload(&mut payload).await? {
        Some(b) => b,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "No file uploaded"
            })));
        }
    };

    info!(size = bytes.len(), "Spreadsheet received");

    let sheet = match ingest::read_workbook(&bytes) {
        Ok(s) => s,
        Err(e) => {
            info!(error = %e, "Workbook rejected");
            return Ok(HttpResponse::BadRequest().json(json!({ "error": e.to_string() })));
        }
    };

    let items = match ingest::to_sales_items(&sheet) {
        Ok(items) => items,
        Err(e) => {
            info!(error = %e, "Sheet validation failed");
            return Ok(HttpResponse::BadRequest().json(json!({ "error": e.to_string() })));
        }
    };

    debug!(rows = items.len(), "Sheet normalized, inserting batch");

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            error!(error = %e, "Failed to open transaction");
            return Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to insert sales items into database"
            })));
        }
    };

    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let result = sqlx::query(INSERT_SALES_ITEM)
            .bind(item.date)
            .bind(&item.order_number)
            .bind(&item.item_name)
            .bind(item.selling_price)
            .bind(item.quantity)
            .bind(item.buying_price)
            .bind(&item.payment_mode)
            .bind(item.profit())
            .bind(item.revenue())
            .execute(&mut *tx)
            .await;

        match result {
            Ok(res) => inserted.push(SalesItem {
                id: res.last_insert_id(),
                date: item.date,
                order_number: item.order_number,
                item_name: item.item_name,
                selling_price: item.selling_price,
                quantity: item.quantity,
                buying_price: item.buying_price,
                payment_mode: item.payment_mode,
                profit: item.selling_price - item.buying_price,
                revenue: item.selling_price,
            }),
            Err(e) => {
                error!(error = %e, "Bulk insert failed, rolling back");
                let _ = tx.rollback().await;
                return Ok(HttpResponse::InternalServerError().json(json!({
                    "error": "Failed to insert sales items into database"
                })));
            }
        }
    }

    if let Err(e) = tx.commit().await {
        error!(error = %e, "Failed to commit sales batch");
        return Ok(HttpResponse::InternalServerError().json(json!({
            "error": "Failed to insert sales items into database"
        })));
    }

    info!(rows = inserted.len(), "Spreadsheet imported");
    Ok(HttpResponse::Ok().json(inserted))
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct TopSellingItem {
    pub name: String,
    pub quantity: f64,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct PaymentMethodCount {
    pub method: String,
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_sales: f64,
    pub average_order_value: f64,
    pub top_selling_items: Vec<TopSellingItem>,
    pub payment_methods: Vec<PaymentMethodCount>,
}

/// Sales summary
#[utoipa::path(
    get,
    path = "/api/sales/summary",
    responses(
        (status = 200, description = "Aggregates across all sales items", body = SalesSummary)
    ),
    tag = "Sales",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn sales_summary(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let totals = sqlx::query_as::<_, (Option<f64>, Option<f64>, Option<f64>, Option<f64>)>(
        r#"
        SELECT
            SUM(revenue),
            SUM(profit),
            SUM(quantity),
            AVG(revenue)
        FROM sales_items
        "#,
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch sales totals");
        actix_web::error::ErrorInternalServerError("Failed to fetch sales summary")
    })?;

    let top_selling_items = sqlx::query_as::<_, TopSellingItem>(
        r#"
        SELECT item_name AS name, SUM(quantity) AS quantity
        FROM sales_items
        GROUP BY item_name
        ORDER BY quantity DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch top selling items");
        actix_web::error::ErrorInternalServerError("Failed to fetch sales summary")
    })?;

    let payment_methods = sqlx::query_as::<_, PaymentMethodCount>(
        r#"
        SELECT payment_mode AS method, COUNT(*) AS count
        FROM sales_items
        GROUP BY payment_mode
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch payment method counts");
        actix_web::error::ErrorInternalServerError("Failed to fetch sales summary")
    })?;

    let (revenue, profit, sales, avg) = totals;

    Ok(HttpResponse::Ok().json(SalesSummary {
        total_revenue: revenue.unwrap_or(0.0),
        total_profit: profit.unwrap_or(0.0),
        total_sales: sales.unwrap_or(0.0),
        average_order_value: avg.unwrap_or(0.0),
        top_selling_items,
        payment_methods,
    }))
}
