use cf_collections::{AutodateField, Collection, JsonField, NumberField, TextField};

use crate::AUTHENTICATED_ONLY;

pub const NAME: &str = "usage_logs";

/// One metered model call. `user_id` points at a `cf_users` row by convention only.
pub fn collection() -> Collection {
    let mut logs = Collection::new_base(NAME);
    logs.list_rule = Some(AUTHENTICATED_ONLY.to_owned());
    logs.view_rule = Some(AUTHENTICATED_ONLY.to_owned());

    logs.fields.add(TextField {
        name: "tenant_id".into(),
        required: true,
        ..Default::default()
    });
    logs.fields.add(TextField {
        name: "user_id".into(),
        required: true,
        ..Default::default()
    });
    logs.fields.add(TextField {
        name: "model".into(),
        required: true,
        max: Some(255),
        ..Default::default()
    });
    for counter in ["input_tokens", "output_tokens", "total_tokens", "cost"] {
        logs.fields.add(NumberField {
            name: counter.into(),
            required: true,
            min: Some(0.0),
            no_decimal: false,
            ..Default::default()
        });
    }
    logs.fields.add(TextField {
        name: "request_id".into(),
        ..Default::default()
    });
    logs.fields.add(JsonField {
        name: "metadata".into(),
        ..Default::default()
    });
    logs.fields.add(AutodateField {
        name: "created".into(),
        system: true,
        on_create: true,
        ..Default::default()
    });
    logs.fields.add(AutodateField {
        name: "updated".into(),
        system: true,
        on_create: true,
        on_update: true,
        ..Default::default()
    });

    logs.add_index("idx_usage_logs_tenant", false, "tenant_id", "");
    logs.add_index("idx_usage_logs_user", false, "user_id", "");
    logs.add_index("idx_usage_logs_created", false, "created", "");
    logs
}
