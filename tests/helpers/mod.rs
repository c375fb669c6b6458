
/// The example notification from the alert manager's webhook documentation.
pub const REFERENCE_PAYLOAD: &str = r#"{
  "version": "4",
  "groupKey": "not-used",
  "truncatedAlerts": 0,
  "status": "firing",
  "receiver": "not-used",
  "groupLabels": {"not": "used"},
  "commonLabels": {"not": "used"},
  "commonAnnotations": {"not": "used"},
  "externalURL": "https://youralertmanager/the-alert",
  "alerts": [
    {
      "status": "firing",
      "labels": {
        "alertname": "InstanceDown",
        "instance": "http://example.com",
        "job": "blackbox"
      },
      "annotations": {
        "description": "Unable to scrape $labels.instance",
        "summary": "Address $labels.instance appears to be down with $labels.alertname"
      },
      "startsAt": "2017-01-06T19:34:52.887Z",
      "endsAt": "0000-01-01T00:00:00.000Z",
      "generatorURL": "https://probably/dns/or/something",
      "fingerprint": "abc321"
    }
  ]
}"#;

pub const REFERENCE_MESSAGE: &str = r#""Address http://example.com appears to be down with InstanceDown" alert started at Fri, 06 Jan 2017 19:34:52 UTC"#;
