//! Built-in default workflow: search, inspect, add to cart, checkout

use crate::workflow::definition::Workflow;
use crate::workflow::schema::{ExtractSchema, SchemaField};
use crate::workflow::step::WorkflowStep;

pub const PURCHASE_FLOW_ID: &str = "de99949f-9ad3-4e79-9156-e7c98ad66702";

/// Schema for the product listing pulled off the search results page
pub fn product_listing_schema() -> ExtractSchema {
    ExtractSchema::new().field(
        "products",
        SchemaField::array(SchemaField::object([
            ("name", SchemaField::string().optional()),
            ("price", SchemaField::number().optional()),
            ("availability", SchemaField::string().optional()),
            ("condition", SchemaField::string().optional()),
        ])),
    )
}

/// The retail purchase flow: eight steps ending at the checkout page
pub fn purchase_flow() -> Workflow {
    Workflow::new("amazon-checkout")
        .with_id(PURCHASE_FLOW_ID)
        .with_variable("search_term", "Nintendo Switch OLED console")
        .step(WorkflowStep::navigate("https://amazon.com/"))
        .step(WorkflowStep::act("type {{search_term}} into the search box"))
        .step(WorkflowStep::act("click the search button"))
        .step(WorkflowStep::extract(
            "extract all {{search_term}} products visible on this page with their names, prices, and availability status",
            product_listing_schema(),
        ))
        .step(WorkflowStep::act(
            "click the Nintendo Switch – OLED Model w/White Joy-Con product",
        ))
        .step(WorkflowStep::act("click the Add to Cart button"))
        .step(WorkflowStep::act("click the Cart button"))
        .step(WorkflowStep::act("click the Proceed to checkout button"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::step::StepKind;

    #[test]
    fn test_purchase_flow_shape() {
        let workflow = purchase_flow();
        let kinds: Vec<StepKind> = workflow.steps.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Navigate,
                StepKind::Act,
                StepKind::Act,
                StepKind::Extract,
                StepKind::Act,
                StepKind::Act,
                StepKind::Act,
                StepKind::Act,
            ]
        );
    }

    #[test]
    fn test_purchase_flow_resolves() {
        let steps = purchase_flow().resolve().unwrap();
        assert_eq!(
            steps[1].text(),
            "type Nintendo Switch OLED console into the search box"
        );
        assert!(steps[3].text().starts_with("extract all Nintendo Switch OLED console products"));
    }
}
