use crate::api::payroll::PayrollRun;
use crate::error::FieldError;
use crate::finance::{
    dashboard::{Dashboard, Metrics, MonthlyTotals, Transaction, TransactionKind},
    payroll::PayrollCalculation,
    reports::{
        CategoryTotal, DepartmentTotal, ExpenseLine, ExpenseReport, FinancialReport, PayrollLine,
        PayrollReport,
    },
};
use crate::model::{
    employee::{Employee, EmployeeInput},
    expense::{Expense, ExpenseInput},
    expense_category::{ExpenseCategory, ExpenseCategoryInput},
    income::{IncomeRecord, IncomeRecordInput},
    payroll::{PayrollRecord, PayrollRecordInput, PayrollStatus},
    user::{Role, User, UserInput},
};
use crate::models::{LoginReqDto, LoginResponse, TokenPair};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PlexPay API",
        version = "1.0.0",
        description = r#"
## PlexPay back-office

Bookkeeping for a small business: expenses, income, employees and payroll,
with a dashboard and downloadable reports.

### Security
Everything except login, refresh and logout needs a **JWT Bearer** access
token. User management is restricted to the **admin** role.

### Money
Amounts are decimal strings (`"1250.00"`). Request bodies accept strings or
numbers.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,

        crate::api::expense_category::list_categories,
        crate::api::expense_category::get_category,
        crate::api::expense_category::create_category,
        crate::api::expense_category::update_category,
        crate::api::expense_category::delete_category,

        crate::api::expense::list_expenses,
        crate::api::expense::get_expense,
        crate::api::expense::create_expense,
        crate::api::expense::update_expense,
        crate::api::expense::delete_expense,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::payroll::list_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::delete_payroll,
        crate::api::payroll::preview_payroll,
        crate::api::payroll::process_payroll,

        crate::api::income::list_income,
        crate::api::income::get_income,
        crate::api::income::create_income,
        crate::api::income::update_income,
        crate::api::income::delete_income,

        crate::api::dashboard::get_dashboard,
        crate::api::report::financial_report,
        crate::api::report::expense_report,
        crate::api::report::payroll_report,
        crate::api::report::export_financial,
        crate::api::report::export_expenses,
        crate::api::report::export_payroll
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            TokenPair,
            FieldError,
            Role,
            User,
            UserInput,
            ExpenseCategory,
            ExpenseCategoryInput,
            Expense,
            ExpenseInput,
            Employee,
            EmployeeInput,
            PayrollStatus,
            PayrollRecord,
            PayrollRecordInput,
            PayrollRun,
            PayrollCalculation,
            IncomeRecord,
            IncomeRecordInput,
            Dashboard,
            Metrics,
            MonthlyTotals,
            Transaction,
            TransactionKind,
            FinancialReport,
            ExpenseReport,
            ExpenseLine,
            CategoryTotal,
            PayrollReport,
            PayrollLine,
            DepartmentTotal
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token lifecycle"),
        (name = "User", description = "User management (admin only)"),
        (name = "Expense Category", description = "Expense categories"),
        (name = "Expense", description = "Expense tracking"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Payroll", description = "Payroll records and monthly processing"),
        (name = "Income", description = "Income tracking"),
        (name = "Report", description = "Dashboard, reports and CSV exports"),
    )
)]
pub struct ApiDoc;

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented_with_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/payroll-records/process"));
        assert!(doc.paths.paths.contains_key("/api/reports/expenses/export"));
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
