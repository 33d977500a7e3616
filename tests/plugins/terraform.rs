use riskgate::core::config::EngineConfig;
use riskgate::core::model::{Category, RawRecord, Severity};
use riskgate::engine::evaluate_records;
use riskgate::engine::gate::GateOutcome;
use riskgate::plugins::terraform;
use riskgate::sources;
use serde_json::{Value, json};

fn plan() -> Value {
    json!({
        "format_version": "1.2",
        "terraform_version": "1.7.5",
        "resource_changes": [
            {
                "address": "aws_db_instance.main",
                "mode": "managed",
                "type": "aws_db_instance",
                "name": "main",
                "change": {
                    "actions": ["delete", "create"],
                    "before": {"engine": "postgres", "password": "hunter2hunter2", "allocated_storage": 20},
                    "after": {"engine": "postgres", "password": "n3w-s3cret-value", "allocated_storage": 50},
                    "before_sensitive": {"password": true},
                    "after_sensitive": {"password": true}
                }
            },
            {
                "address": "aws_iam_role.deploy",
                "mode": "managed",
                "type": "aws_iam_role",
                "change": {
                    "actions": ["update"],
                    "before": {"name": "deploy", "tags": {"team": "a"}},
                    "after": {"name": "deploy", "tags": {"team": "b"}},
                    "before_sensitive": {},
                    "after_sensitive": {}
                }
            },
            {
                "address": "aws_s3_bucket.assets",
                "mode": "managed",
                "type": "aws_s3_bucket",
                "change": {"actions": ["no-op"], "before": {}, "after": {}}
            },
            {
                "address": "data.aws_ami.ubuntu",
                "mode": "data",
                "type": "aws_ami",
                "change": {"actions": ["read"]}
            },
            {
                "address": "module.app.aws_instance.web[0]",
                "mode": "managed",
                "type": "aws_instance",
                "change": {
                    "actions": ["create"],
                    "before": null,
                    "after": {"ami": "ami-123", "user_data": "secret-bootstrap"},
                    "after_sensitive": {"user_data": true}
                }
            }
        ],
        "configuration": {
            "root_module": {
                "resources": [
                    {"address": "aws_iam_role.deploy", "depends_on": ["aws_db_instance.main"]}
                ],
                "module_calls": {
                    "app": {
                        "module": {
                            "resources": [
                                {"address": "aws_instance.web", "depends_on": ["aws_security_group.web"]}
                            ]
                        }
                    }
                }
            }
        }
    })
}

fn changes(records: &[RawRecord]) -> Vec<&riskgate::core::model::ChangeRecord> {
    records
        .iter()
        .map(|r| match r {
            RawRecord::Change(c) => c,
            RawRecord::Finding(_) => panic!("terraform adapter emitted a finding"),
        })
        .collect()
}

#[test]
fn test_skips_data_sources_and_no_ops() {
    let records = terraform::parse(&plan()).unwrap();
    let changes = changes(&records);
    let addresses: Vec<&str> = changes.iter().filter_map(|c| c.address.as_deref()).collect();
    assert_eq!(
        addresses,
        vec!["aws_db_instance.main", "aws_iam_role.deploy", "module.app.aws_instance.web[0]"]
    );
    assert!(changes.iter().all(|c| c.source_tool.as_deref() == Some("terraform")));
}

#[test]
fn test_sensitive_values_never_leave_the_adapter() {
    let records = terraform::parse(&plan()).unwrap();
    let text = serde_json::to_string(&records).unwrap();
    assert!(!text.contains("hunter2hunter2"));
    assert!(!text.contains("n3w-s3cret-value"));
    assert!(!text.contains("secret-bootstrap"));
    assert!(text.contains("sha256:"));

    let db = changes(&records)[0];
    let after = db.attributes_after.as_ref().unwrap();
    assert!(after["password"].is_sensitive());
    assert!(!after["engine"].is_sensitive());
}

#[test]
fn test_depends_on_comes_from_configuration() {
    let records = terraform::parse(&plan()).unwrap();
    let changes = changes(&records);
    assert!(changes[0].depends_on.is_empty());
    assert!(changes[1].depends_on.contains("aws_db_instance.main"));
    assert!(changes[2].depends_on.contains("module.app.aws_security_group.web"));
}

#[test]
fn test_plan_evaluation_end_to_end() {
    let records = sources::ingest("Terraform", &plan().to_string()).unwrap();
    let report = evaluate_records(&records, &EngineConfig::defaults().unwrap());

    assert_eq!(report.metadata.evaluated_count, 3);
    let db = report
        .top_findings
        .iter()
        .find(|r| r.locator.target == "aws_db_instance.main")
        .unwrap();
    assert_eq!(db.category, Category::Replace);
    assert_eq!(db.severity, Severity::Critical);
    assert_eq!(db.provenance, vec!["terraform"]);
    assert!(db.sensitive_fields_touched.contains("password"));

    let web = report
        .top_findings
        .iter()
        .find(|r| r.resource_type.as_deref() == Some("aws_instance"))
        .unwrap();
    assert_eq!(web.category, Category::Add);
    assert_eq!(web.severity, Severity::Info);

    assert_eq!(report.decision, GateOutcome::Block);
}

#[test]
fn test_unchanged_sensitive_value_does_not_escalate_modify() {
    let plan = json!({
        "resource_changes": [{
            "address": "aws_rds_cluster.main",
            "mode": "managed",
            "type": "aws_rds_cluster",
            "change": {
                "actions": ["update"],
                "before": {"master_password": "same", "backup_retention_period": 7},
                "after": {"master_password": "same", "backup_retention_period": 14},
                "before_sensitive": {"master_password": true},
                "after_sensitive": {"master_password": true}
            }
        }]
    });
    let records = terraform::parse(&plan).unwrap();
    let report = evaluate_records(&records, &EngineConfig::defaults().unwrap());
    let record = &report.top_findings[0];
    assert_eq!(record.category, Category::Modify);
    assert_eq!(record.severity, Severity::Medium);
    assert!(record.sensitive_fields_touched.is_empty());
}

#[test]
fn test_schema_lists_what_it_reads() {
    let schema = terraform::schema();
    assert_eq!(schema["name"], "terraform");
    assert_eq!(schema["emits"], "change");
}
