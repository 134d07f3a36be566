use proptest::prelude::*;

use statviz_map::{MappingError, RoleAssignment};
use statviz_model::{VariableMapping, VariableRole};

const COLUMNS: [&str; 5] = ["Block", "Variety", "Yield", "Height", "Rainfall"];

#[test]
fn dependent_assignment_evicts_previous_occupant() {
    let mut state = RoleAssignment::new(COLUMNS);

    let first = state.assign("Yield", VariableRole::Dependent).expect("assign");
    assert_eq!(first.evicted, None);
    assert!(!state.available().contains(&"Yield"));

    let second = state.assign("Height", VariableRole::Dependent).expect("assign");
    assert_eq!(second.evicted.as_deref(), Some("Yield"));
    assert_eq!(second.mapping.dependent_variable.as_deref(), Some("Height"));
    assert!(state.available().contains(&"Yield"));
    assert!(!state.available().contains(&"Height"));
}

#[test]
fn reassigning_moves_a_column_between_roles() {
    let mut state = RoleAssignment::new(COLUMNS);
    state.assign("Variety", VariableRole::Independent).expect("assign");
    state.assign("Block", VariableRole::Independent).expect("assign");

    let moved = state.assign("Variety", VariableRole::Covariate).expect("move");
    assert_eq!(moved.mapping.independent_variables, vec!["Block"]);
    assert_eq!(moved.mapping.covariates, vec!["Variety"]);
    assert_eq!(moved.evicted, None);
}

#[test]
fn reassigning_to_same_list_moves_to_end() {
    let mut state = RoleAssignment::new(COLUMNS);
    state.assign("Variety", VariableRole::Independent).expect("assign");
    state.assign("Block", VariableRole::Independent).expect("assign");
    let again = state.assign("Variety", VariableRole::Independent).expect("assign");
    assert_eq!(again.mapping.independent_variables, vec!["Block", "Variety"]);
}

#[test]
fn same_single_slot_assignment_is_not_an_eviction() {
    let mut state = RoleAssignment::new(COLUMNS);
    state.assign("Yield", VariableRole::Values).expect("assign");
    let again = state.assign("Yield", VariableRole::Values).expect("assign");
    assert_eq!(again.evicted, None);
    assert_eq!(again.mapping.values_column.as_deref(), Some("Yield"));
}

#[test]
fn unknown_column_suggests_closest_name() {
    let mut state = RoleAssignment::new(COLUMNS);
    let err = state
        .assign("Yeild", VariableRole::Dependent)
        .expect_err("unknown column");
    assert_eq!(
        err,
        MappingError::ColumnNotFound {
            column: "Yeild".to_string(),
            suggestion: Some("Yield".to_string()),
        }
    );
    assert_eq!(
        err.to_string(),
        "column 'Yeild' not found (did you mean 'Yield'?)"
    );
}

#[test]
fn restore_drops_unknown_and_repeated_columns() {
    let initial = VariableMapping {
        dependent_variable: Some("Yield".to_string()),
        independent_variables: vec!["Variety".to_string(), "Soil".to_string()],
        values_column: None,
        covariates: vec!["Variety".to_string(), "Rainfall".to_string()],
    };
    let state = RoleAssignment::from_mapping(COLUMNS, &initial);
    let mapping = state.mapping();
    assert_eq!(mapping.independent_variables, vec!["Variety"]);
    assert_eq!(mapping.covariates, vec!["Rainfall"]);
    assert_eq!(state.available(), vec!["Block", "Height"]);

    let summary = state.summary();
    assert_eq!(summary.total_columns, 5);
    assert_eq!(summary.assigned, 3);
    assert_eq!(summary.available, 2);
    assert!(summary.ready);
}

#[test]
fn unassign_and_clear_return_columns_to_pool() {
    let mut state = RoleAssignment::new(COLUMNS);
    state.assign("Yield", VariableRole::Dependent).expect("assign");
    state.assign("Variety", VariableRole::Independent).expect("assign");

    let mapping = state.unassign("Yield").expect("unassign");
    assert_eq!(mapping.dependent_variable, None);
    assert_eq!(state.available().len(), 4);

    let cleared = state.clear();
    assert_eq!(cleared, VariableMapping::default());
    assert_eq!(state.available(), COLUMNS.to_vec());
}

#[derive(Debug, Clone)]
enum Op {
    Assign(usize, VariableRole),
    Unassign(usize),
}

fn role_strategy() -> impl Strategy<Value = VariableRole> {
    prop_oneof![
        Just(VariableRole::Dependent),
        Just(VariableRole::Independent),
        Just(VariableRole::Values),
        Just(VariableRole::Covariate),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..COLUMNS.len(), role_strategy()).prop_map(|(idx, role)| Op::Assign(idx, role)),
        1 => (0..COLUMNS.len()).prop_map(Op::Unassign),
    ]
}

proptest! {
    #[test]
    fn no_column_holds_two_roles(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut state = RoleAssignment::new(COLUMNS);
        for op in ops {
            let mapping = match op {
                Op::Assign(idx, role) => state.assign(COLUMNS[idx], role).expect("known column").mapping,
                Op::Unassign(idx) => state.unassign(COLUMNS[idx]).expect("known column"),
            };

            let mut assigned = mapping.assigned_columns();
            let count = assigned.len();
            assigned.sort_unstable();
            assigned.dedup();
            prop_assert_eq!(assigned.len(), count);

            let available = state.available();
            prop_assert_eq!(available.len() + count, COLUMNS.len());
            for column in COLUMNS {
                prop_assert_eq!(available.contains(&column), mapping.role_of(column).is_none());
            }
        }
    }

    #[test]
    fn dependent_assignment_keeps_pool_complete(first in 0..COLUMNS.len(), second in 0..COLUMNS.len()) {
        let mut state = RoleAssignment::new(COLUMNS);
        state.assign(COLUMNS[first], VariableRole::Dependent).expect("assign");
        let outcome = state.assign(COLUMNS[second], VariableRole::Dependent).expect("assign");

        prop_assert!(!state.available().contains(&COLUMNS[second]));
        if first == second {
            prop_assert_eq!(outcome.evicted, None);
        } else {
            prop_assert_eq!(outcome.evicted.as_deref(), Some(COLUMNS[first]));
            prop_assert!(state.available().contains(&COLUMNS[first]));
        }
    }
}
