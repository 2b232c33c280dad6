//! End-to-end scenarios against the store.

use practica::model::instrument::{Instrument, InstrumentDetail};
use practica::model::practice::{ParamValue, Parameters};
use practica::model::{CompletionStatus, DomainType, QualityRating, SessionType};
use practica::storage::Store;

#[test]
fn full_practice_scenario() {
    let mut store = Store::open_in_memory().unwrap();

    let practice_id = store
        .with_txn(|txn| {
            let guitar = txn.create_instrument(
                "Test Guitar",
                &InstrumentDetail::Stringed {
                    string_count: 6,
                    scale_length: Some(25.5),
                },
            )?;
            let exercise =
                txn.create_exercise("Chromatic Scale", &[DomainType::Technique], &[], None)?;
            let practice = txn.create_practice(
                guitar.id,
                "2025-01-15".parse().unwrap(),
                SessionType::Normal,
                60,
            )?;
            let mut parameters = Parameters::new();
            parameters.insert("tempo".to_string(), ParamValue::Int(120));
            let instance =
                txn.create_exercise_instance(practice.id, exercise.id, 1, &parameters)?;
            txn.create_exercise_log(
                instance.id,
                CompletionStatus::Yes,
                QualityRating::Clean,
                None,
            )?;
            Ok(practice.id)
        })
        .unwrap();

    // Read back in a fresh transaction.
    store
        .with_txn(|txn| {
            let instances = txn.instances_for_practice(practice_id)?;
            assert_eq!(instances.len(), 1);
            assert_eq!(instances[0].sequence_order, 1);
            assert_eq!(
                instances[0].parameters.get("tempo"),
                Some(&ParamValue::Int(120))
            );

            let log = txn.log_for_instance(instances[0].id)?.unwrap();
            assert_eq!(log.completion_status, CompletionStatus::Yes);
            assert_eq!(log.quality_rating, QualityRating::Clean);
            Ok(())
        })
        .unwrap();
}

#[test]
fn polymorphic_read_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("practica.db");

    {
        let mut store = Store::open(&db_path).unwrap();
        store
            .with_txn(|txn| {
                txn.create_instrument(
                    "Guitar",
                    &InstrumentDetail::Stringed {
                        string_count: 6,
                        scale_length: None,
                    },
                )?;
                txn.create_instrument("Piano", &InstrumentDetail::Keyboard)?;
                Ok(())
            })
            .unwrap();
    }

    // Reopen from disk: variants must come back concretely typed.
    let mut store = Store::open(&db_path).unwrap();
    let all: Vec<Instrument> = store.with_txn(|txn| txn.list_instruments(0, 100)).unwrap();
    assert_eq!(all.len(), 2);
    assert!(matches!(
        all[0].detail,
        InstrumentDetail::Stringed { string_count: 6, .. }
    ));
    assert!(matches!(all[1].detail, InstrumentDetail::Keyboard));
}

#[test]
fn mid_operation_failure_is_invisible_afterwards() {
    let mut store = Store::open_in_memory().unwrap();

    // A constraint failure after a successful insert rolls the whole
    // transaction back.
    let result = store.with_txn(|txn| {
        txn.create_technique("legato", None)?;
        txn.create_technique("legato", None)?;
        Ok(())
    });
    assert!(result.is_err());

    let techniques = store.with_txn(|txn| txn.list_techniques(0, 10)).unwrap();
    assert!(techniques.is_empty());
}
