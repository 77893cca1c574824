#![cfg(test)]

//! Test assertions to check generated SQL statements and parameters.

/// Assert that the given parameters match the expected ones.
macro_rules! assert_params {
    ($actual_params:expr $(, $expected_param:expr)*) => {
        let actual_params = $actual_params;
        let expected_params: Vec<Box<dyn $crate::sql::SQLParam>> =
            vec![$(Box::new($expected_param)),*];
        assert_eq!(
            actual_params.len(),
            expected_params.len(),
            "parameter count mismatch"
        );
        for (actual, expected) in actual_params.iter().zip(expected_params.iter()) {
            assert!(
                $crate::sql::SQLParam::eq(actual.as_ref(), expected.as_ref()),
                "parameter mismatch: {:?} vs {:?}",
                actual,
                expected
            );
        }
    };
}

/// Assert that a `(statement, params)` pair matches the expected statement and parameters.
macro_rules! assert_binding {
    ($actual:expr, $expected_stmt:expr $(, $expected_param:expr)*) => {
        let (actual_stmt, actual_params) = $actual;
        assert_eq!(actual_stmt, $expected_stmt);
        assert_params!(actual_params $(, $expected_param)*);
    };
}
