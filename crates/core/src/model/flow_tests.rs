// SPDX-License-Identifier: MIT

use super::*;

fn step(id: &str, depends_on: &[&str]) -> FlowStep {
    FlowStep {
        id: id.to_string(),
        name: id.to_string(),
        agent: "senior-coder".to_string(),
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        input: InputSource::Request,
        transform: None,
        retry: None,
        timeout_ms: None,
        condition: None,
    }
}

fn flow(steps: Vec<FlowStep>, output_from: &str) -> Flow {
    Flow {
        id: "code-review".to_string(),
        steps,
        max_parallelism: 2,
        fail_fast: true,
        timeout_ms: None,
        output: FlowOutput { from: output_from.to_string(), format: "markdown".to_string() },
    }
}

#[test]
fn input_source_parses_request() {
    assert_eq!(InputSource::parse("request"), Some(InputSource::Request));
}

#[test]
fn input_source_parses_aggregate() {
    assert_eq!(InputSource::parse("aggregate"), Some(InputSource::Aggregate));
}

#[test]
fn input_source_parses_step_reference() {
    assert_eq!(InputSource::parse("step:analyze-code"), Some(InputSource::Step { id: "analyze-code".to_string() }));
}

#[test]
fn input_source_rejects_unknown_directive() {
    assert_eq!(InputSource::parse("nonsense"), None);
}

#[test]
fn valid_diamond_dag_passes_validation() {
    let f = flow(
        vec![
            step("analyze-code", &[]),
            step("security-review", &["analyze-code"]),
            step("performance-review", &["analyze-code"]),
            step("final-report", &["security-review", "performance-review"]),
        ],
        "final-report",
    );
    assert!(f.validate().is_ok());
}

#[test]
fn diamond_dag_layers_group_parallel_steps() {
    let f = flow(
        vec![
            step("analyze-code", &[]),
            step("security-review", &["analyze-code"]),
            step("performance-review", &["analyze-code"]),
            step("final-report", &["security-review", "performance-review"]),
        ],
        "final-report",
    );
    let layers = f.layers().unwrap();
    assert_eq!(layers[0], vec!["analyze-code"]);
    let mut middle = layers[1].clone();
    middle.sort();
    assert_eq!(middle, vec!["performance-review", "security-review"]);
    assert_eq!(layers[2], vec!["final-report"]);
}

#[test]
fn cycle_is_rejected() {
    let f = flow(vec![step("a", &["b"]), step("b", &["a"])], "a");
    assert_eq!(f.validate(), Err(FlowValidationError::Cycle("code-review".to_string())));
}

#[test]
fn unknown_dependency_is_rejected() {
    let f = flow(vec![step("a", &["ghost"])], "a");
    assert!(matches!(f.validate(), Err(FlowValidationError::UnknownDependency(_, _, _))));
}

#[test]
fn empty_flow_is_rejected() {
    let f = flow(vec![], "a");
    assert_eq!(f.validate(), Err(FlowValidationError::NoSteps("code-review".to_string())));
}

#[test]
fn duplicate_step_id_is_rejected() {
    let f = flow(vec![step("a", &[]), step("a", &[])], "a");
    assert!(matches!(f.validate(), Err(FlowValidationError::DuplicateStepId(_, _))));
}

#[test]
fn unknown_output_step_is_rejected() {
    let f = flow(vec![step("a", &[])], "ghost");
    assert!(matches!(f.validate(), Err(FlowValidationError::UnknownOutputStep(_, _))));
}
