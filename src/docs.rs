use crate::api::sales::{self, PaymentMethodCount, SalesSummary, TopSellingItem};
use crate::api::users::{self, UpdateRoleReq};
use crate::model::role::Role;
use crate::model::sales_item::{NewSalesItem, SalesItem};
use crate::model::user::UserProfile;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Excel Flow Analyzer API",
        version = "1.0.0",
        description = r#"
## Excel Flow Analyzer

Sales-tracking backend for small businesses.

### Key Features
- **Sales Records**
  - List, create and delete individual sales transactions
- **Spreadsheet Import**
  - Upload an Excel workbook; rows are validated, normalized and
    inserted as a single all-or-nothing batch
- **Dashboards**
  - Revenue/profit totals, top selling items and payment method counts
- **User Management**
  - Admin-only role assignment and account removal

### Security
Endpoints are protected with **JWT Bearer authentication**. Mutations
require the **manager** role; user management requires **admin**.
"#,
    ),
    paths(
        sales::list_sales,
        sales::create_sale,
        sales::delete_sale,
        sales::upload_sales,
        sales::sales_summary,

        users::list_users,
        users::update_user_role,
        users::delete_user
    ),
    components(
        schemas(
            SalesItem,
            NewSalesItem,
            SalesSummary,
            TopSellingItem,
            PaymentMethodCount,
            UserProfile,
            UpdateRoleReq,
            Role
        )
    ),
    tags(
        (name = "Sales", description = "Sales record and import APIs"),
        (name = "Users", description = "User management APIs"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
