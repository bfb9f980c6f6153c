/// Asserts the harness' process is in the given stage.
#[macro_export]
macro_rules! assert_stage {
    ($harness:expr, $stage:expr) => {
        assert_eq!(
            $harness.stage(),
            $stage,
            "Unexpected stage for structure {}",
            $harness.station
        );
    };
}

/// Asserts a percentage accessor stays within [0, 1].
#[macro_export]
macro_rules! assert_unit_range {
    ($value:expr) => {
        let v: f32 = $value;
        assert!((0.0..=1.0).contains(&v), "{} is outside [0, 1]", v);
    };
}

/// Asserts a start request was refused for the given reason.
#[macro_export]
macro_rules! assert_rejected {
    ($result:expr, $rejection:expr) => {
        match $result {
            Err(synthesis_lib::model::error::FusionError::Rejected(r)) => assert_eq!(r, $rejection),
            Err(other) => panic!("Expected rejection {:?}, got {:?}", $rejection, other),
            Ok(_) => panic!("Expected rejection {:?}, but fusion started", $rejection),
        }
    };
}
