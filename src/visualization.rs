use crate::engine::ledger::Ledger;
use crate::error::DivvyError;
use crate::service::ExpenseService;
use log::{debug, error};
use serde_json::{Value, json};
use uuid::Uuid;

// Generates Chart.js configuration for visualizing net balances in a group
pub struct Visualization;

impl Visualization {
    /// Generates a Chart.js bar chart configuration for a group's net balances.
    ///
    /// # Arguments
    /// * `service` - Used to resolve user names for the chart labels.
    /// * `ledger` - Net balances as produced by `ExpenseService::group_balances`.
    ///
    /// # Returns
    /// A JSON Value containing the Chart.js configuration, or an error when a
    /// balance belongs to an unknown user.
    pub fn generate_balance_chart(
        service: &ExpenseService<'_>,
        ledger: &Ledger<Uuid>,
    ) -> Result<Value, DivvyError> {
        debug!("Generating balance chart for {} participants", ledger.len());

        let mut labels: Vec<String> = Vec::new();
        let mut data: Vec<f64> = Vec::new();
        for (&user_id, balance) in ledger {
            let user = service.storage.get_user(user_id).ok_or_else(|| {
                error!("User {} in ledger has no stored row", user_id);
                DivvyError::UserNotFound(user_id)
            })?;
            labels.push(user.name);
            data.push(balance.to_decimal());
        }

        // Rotate through a small palette so any number of users gets colors
        let base_colors = [
            (75, 192, 192),  // Teal
            (255, 99, 132),  // Red
            (54, 162, 235),  // Blue
            (255, 206, 86),  // Yellow
            (153, 102, 255), // Purple
        ];
        let mut background_colors = Vec::new();
        let mut border_colors = Vec::new();
        for i in 0..labels.len() {
            let (r, g, b) = base_colors[i % base_colors.len()];
            background_colors.push(format!("rgba({}, {}, {}, 0.6)", r, g, b));
            border_colors.push(format!("rgba({}, {}, {}, 1)", r, g, b));
        }

        Ok(json!({
            "type": "bar",
            "data": {
                "labels": labels,
                "datasets": [{
                    "label": "Net Balances",
                    "data": data,
                    "backgroundColor": background_colors,
                    "borderColor": border_colors,
                    "borderWidth": 1
                }]
            },
            "options": {
                "scales": {
                    "y": {
                        "beginAtZero": true,
                        "title": {
                            "display": true,
                            "text": "Balance"
                        }
                    }
                }
            }
        }))
    }
}
