use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use contact_cleanup::{
    cleanup::CleanupPipeline,
    error::{CleanupError, Result},
    people::{
        types::{ContactGroupMembership, Membership, Name, PhoneNumber},
        ConnectionsPage, ContactGroup, ContactsApi, PeopleClient, Person,
    },
    Config,
};
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param, query_param_is_missing},
    Mock, MockServer, ResponseTemplate,
};

/// In-process People API: fixed groups, scripted pages, recorded deletes.
#[derive(Default)]
struct FakeApi {
    groups: Vec<ContactGroup>,
    pages: Mutex<Vec<Result<ConnectionsPage>>>,
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl ContactsApi for FakeApi {
    async fn list_connections(&self, _page_token: Option<&str>, _page_size: u32) -> Result<ConnectionsPage> {
        self.pages.lock().unwrap().remove(0)
    }

    async fn delete_contact(&self, resource_name: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(resource_name.to_string());
        Ok(())
    }

    async fn list_contact_groups(&self) -> Result<Vec<ContactGroup>> {
        Ok(self.groups.clone())
    }
}

fn person(id: &str, phones: &[&str], groups: &[&str]) -> Person {
    Person {
        resource_name: format!("people/{}", id),
        names: vec![Name {
            display_name: format!("Contact {}", id),
        }],
        phone_numbers: phones
            .iter()
            .map(|p| PhoneNumber {
                value: p.to_string(),
                ..Default::default()
            })
            .collect(),
        memberships: groups.iter().map(|g| Membership::of_group(g)).collect(),
    }
}

fn spam_groups() -> Vec<ContactGroup> {
    vec![
        ContactGroup {
            resource_name: "contactGroups/family".to_string(),
            name: "Family".to_string(),
        },
        ContactGroup {
            resource_name: "contactGroups/g1".to_string(),
            name: "Spam".to_string(),
        },
    ]
}

fn config_in(dir: &std::path::Path) -> Config {
    let mut config = Config::defaults().unwrap();
    config.export.output_dir = dir.to_string_lossy().into_owned();
    config
}

fn csv_rows(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn spam_label_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let api = Arc::new(FakeApi {
        groups: spam_groups(),
        pages: Mutex::new(vec![
            Ok(ConnectionsPage {
                connections: vec![
                    person("1", &["555 010 0001", "555 010 0002"], &["contactGroups/g1"]),
                    person("2", &["555 010 0003"], &["contactGroups/family"]),
                    person("3", &["555 010 0004"], &["contactGroups/g1", "contactGroups/family"]),
                ],
                next_page_token: Some("page-2".to_string()),
            }),
            Ok(ConnectionsPage {
                connections: vec![person("4", &["+1 555 010 0005"], &["contactGroups/g1"])],
                next_page_token: None,
            }),
        ]),
        ..Default::default()
    });

    let pipeline = CleanupPipeline::new(api.clone(), &config, false).unwrap();
    let plan = pipeline.plan("Spam").await.unwrap();

    assert_eq!(plan.group_resource_name, "contactGroups/g1");
    assert_eq!(plan.fetched, 3);
    assert_eq!(plan.partition.kept.len(), 2);
    assert_eq!(plan.partition.to_delete.len(), 1);
    assert_eq!(plan.partition.len(), plan.fetched);

    let kept_rows = csv_rows(&plan.exported.kept);
    assert_eq!(
        kept_rows,
        vec![
            "5550100001|5550100002,Contact 1,More than one phone number",
            "5550100004,Contact 3,More than one label",
        ]
    );
    assert_eq!(csv_rows(&plan.exported.to_delete), vec!["5550100005,Contact 4"]);

    let summary = pipeline.apply(&plan).await;
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(*api.deleted.lock().unwrap(), vec!["people/4"]);
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_stops_before_classification() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let api = Arc::new(FakeApi {
        groups: spam_groups(),
        pages: Mutex::new(vec![
            Ok(ConnectionsPage {
                connections: vec![person("1", &["555 010 0001"], &["contactGroups/g1"])],
                next_page_token: Some("page-2".to_string()),
            }),
            Err(CleanupError::Api {
                status: 500,
                message: "backend error".to_string(),
            }),
        ]),
        ..Default::default()
    });

    let pipeline = CleanupPipeline::new(api.clone(), &config, false).unwrap();
    let err = pipeline.plan("Spam").await.unwrap_err();

    assert!(matches!(err, CleanupError::FetchAborted { pages: 1, .. }));
    assert!(!config.keep_path().exists());
    assert!(!config.delete_path().exists());
    assert!(api.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_label_fails_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi {
        groups: spam_groups(),
        ..Default::default()
    });

    let pipeline = CleanupPipeline::new(api, &config_in(dir.path()), false).unwrap();
    assert!(matches!(
        pipeline.plan("Friends").await,
        Err(CleanupError::LabelNotFound(_))
    ));
    assert!(matches!(pipeline.plan("  ").await, Err(CleanupError::MissingLabel)));
}

#[tokio::test]
async fn unknown_rule_in_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.rules.order.push("starred".to_string());

    let result = CleanupPipeline::new(Arc::new(FakeApi::default()), &config, false);
    assert!(matches!(result, Err(CleanupError::Config(_))));
}

#[tokio::test]
async fn labelled_phone_number_keeps_contact_over_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/contactGroups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contactGroups": [{"resourceName": "contactGroups/g1", "name": "Spam"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/people/me/connections"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "connections": [
                {
                    "resourceName": "people/keep",
                    "phoneNumbers": [{
                        "value": "555 010 0001",
                        "contactGroupMembership": {"contactGroupResourceName": "contactGroups/g1"}
                    }],
                    "memberships": [{"contactGroupMembership": {"contactGroupResourceName": "contactGroups/g1"}}]
                },
                {
                    "resourceName": "people/drop",
                    "phoneNumbers": [{"value": "555 010 0002"}],
                    "memberships": [{"contactGroupMembership": {"contactGroupResourceName": "contactGroups/g1"}}]
                }
            ],
            "nextPageToken": "2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/people/me/connections"))
        .and(query_param("pageToken", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/people/drop:deleteContact"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/people/drop:deleteContact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .with_priority(2)
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.people.base_url = server.uri();
    config.limits.initial_backoff_secs = 0;
    config.limits.list_calls_per_minute = 6000;
    config.limits.delete_calls_per_minute = 6000;

    let client = PeopleClient::new(&config.people.base_url, "tok".to_string()).unwrap();
    let pipeline = CleanupPipeline::new(client, &config, false).unwrap();

    let plan = pipeline.plan("Spam").await.unwrap();
    assert_eq!(plan.partition.kept[0].reason, "Phone number has a label");
    assert_eq!(plan.partition.to_delete[0].resource_name, "people/drop");

    let summary = pipeline.apply(&plan).await;
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 0);
}

#[test]
fn membership_helper_matches_wire_shape() {
    let membership = Membership::of_group("contactGroups/g1");
    assert_eq!(
        membership.contact_group_membership,
        Some(ContactGroupMembership {
            contact_group_resource_name: "contactGroups/g1".to_string(),
            contact_group_id: None,
        })
    );
}
