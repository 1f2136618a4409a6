//! Shared fixture: a small screening lab with two spaces, a plate of
//! wells, and the oligos the wells were generated from.

use chrono::Utc;
use samplist::{
    Code, Experiment, ExperimentId, InstanceId, ListerConfig, MaterialId, MaterialRef,
    MemoryStore, PermId, Person, PersonId, PropertyPayload, PropertyRow, PropertyType,
    PropertyTypeId, RelationshipEdge, RelationshipTypeId, SampleId, SampleLister, SampleRow,
    SampleStore, SampleType, SampleTypeId, Scope, Space, SpaceId, VocabularyTerm,
    VocabularyTermId,
};
use std::sync::{Arc, Once};

pub const LINEAGE: RelationshipTypeId = RelationshipTypeId::new(1);

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn sample_row(id: u64, code: &str, type_id: u64, scope: Scope) -> SampleRow {
    SampleRow {
        id: SampleId::new(id),
        perm_id: PermId::new(format!("perm-{id}")),
        code: Code::new(code),
        type_id: SampleTypeId::new(type_id),
        instance_id: InstanceId::new(1),
        scope,
        experiment_id: None,
        container_id: None,
        registrator_id: PersonId::new(1),
        registered_at: Utc::now(),
        invalidated: false,
    }
}

/// Fixture with native set-predicate support.
pub fn fixture_store() -> Arc<MemoryStore> {
    fixture_store_with(true)
}

/// The lab fixture:
/// - spaces LAB1, LAB2; persons alice, bob; experiment EXP1 in LAB1
/// - plate 100 (PLATE1, LAB1, EXP1) containing wells 101 (A01) and
///   102 (A02), both in EXP1
/// - wells were generated from shared oligos 200 and 201
/// - plate 110 (PLATE2) in LAB2 without an experiment, registered by bob
/// - shared, invalidated control plate 120
/// - properties: PH and ORGANISM on well 101, GENE on well 102, SEQ on
///   oligo 200
pub fn fixture_store_with(set_predicates: bool) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::with_set_predicates(set_predicates));

    for (id, code, gen, cont) in [
        (1, "PLATE", 0, 0),
        (2, "WELL", 1, 1),
        (3, "OLIGO", 0, 0),
    ] {
        store.add_sample_type(SampleType {
            id: SampleTypeId::new(id),
            code: Code::new(code),
            generated_from_depth: gen,
            container_depth: cont,
            listable: true,
        });
    }
    for (id, code) in [(1, "LAB1"), (2, "LAB2")] {
        store.add_space(Space {
            id: SpaceId::new(id),
            code: Code::new(code),
            instance_id: InstanceId::new(1),
        });
    }
    for (id, user_id) in [(1, "alice"), (2, "bob")] {
        store.add_person(Person {
            id: PersonId::new(id),
            user_id: user_id.into(),
            email: Some(format!("{user_id}@example.org")),
            first_name: None,
            last_name: None,
        });
    }
    store.add_experiment(Experiment {
        id: ExperimentId::new(7),
        code: Code::new("EXP1"),
        project_code: Code::new("SCREENING"),
        space_code: Code::new("LAB1"),
        type_code: Code::new("SIRNA_HCS"),
    });

    for (id, code, label) in [
        (1, "PH", "pH"),
        (2, "ORGANISM", "Organism"),
        (3, "GENE", "Gene"),
        (4, "SEQ", "Sequence"),
    ] {
        store.add_property_type(PropertyType {
            id: PropertyTypeId::new(id),
            code: Code::new(code),
            label: label.into(),
        });
    }
    store.add_vocabulary_term(VocabularyTerm {
        id: VocabularyTermId::new(10),
        code: Code::new("HUMAN"),
        label: Some("Homo sapiens".into()),
    });
    store.add_material(MaterialRef {
        id: MaterialId::new(20),
        code: Code::new("GFP"),
        type_code: Code::new("GENE"),
    });

    let lab1 = Scope::Space(SpaceId::new(1));
    let lab2 = Scope::Space(SpaceId::new(2));

    let mut plate = sample_row(100, "PLATE1", 1, lab1);
    plate.experiment_id = Some(ExperimentId::new(7));
    store.add_sample(plate);
    for (id, code) in [(101, "A01"), (102, "A02")] {
        let mut well = sample_row(id, code, 2, lab1);
        well.container_id = Some(SampleId::new(100));
        well.experiment_id = Some(ExperimentId::new(7));
        store.add_sample(well);
    }
    let mut plate2 = sample_row(110, "PLATE2", 1, lab2);
    plate2.registrator_id = PersonId::new(2);
    store.add_sample(plate2);
    let mut control = sample_row(120, "CONTROL", 1, Scope::Shared);
    control.invalidated = true;
    store.add_sample(control);
    store.add_sample(sample_row(200, "OLIGO1", 3, Scope::Shared));
    store.add_sample(sample_row(201, "OLIGO2", 3, Scope::Shared));

    for (parent, child) in [(200, 101), (201, 102)] {
        store.add_edge(RelationshipEdge {
            relationship: LINEAGE,
            parent: SampleId::new(parent),
            child: SampleId::new(child),
        });
    }

    store.add_property(PropertyRow {
        sample_id: SampleId::new(101),
        property_type_id: PropertyTypeId::new(1),
        payload: PropertyPayload::Generic("7.4".into()),
    });
    store.add_property(PropertyRow {
        sample_id: SampleId::new(101),
        property_type_id: PropertyTypeId::new(2),
        payload: PropertyPayload::Term(VocabularyTermId::new(10)),
    });
    store.add_property(PropertyRow {
        sample_id: SampleId::new(102),
        property_type_id: PropertyTypeId::new(3),
        payload: PropertyPayload::Material(MaterialId::new(20)),
    });
    store.add_property(PropertyRow {
        sample_id: SampleId::new(200),
        property_type_id: PropertyTypeId::new(4),
        payload: PropertyPayload::Generic("AACGT".into()),
    });

    store
}

pub fn lister(store: Arc<MemoryStore>) -> SampleLister {
    SampleLister::new(store as Arc<dyn SampleStore>, ListerConfig::default())
}
