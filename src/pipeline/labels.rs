//! Get-or-create for the managed label.

use tracing::{debug, info};

use crate::error::GmailError;
use crate::gmail::{Label, MailClient, NewLabel};

/// Ensure a visible label called `name` exists and return it.
///
/// Tries to create it first; when the provider reports a conflict the
/// existing label is looked up by exact name. Other errors propagate.
pub async fn ensure_label(client: &dyn MailClient, name: &str) -> Result<Label, GmailError> {
    match client.create_label(&NewLabel::visible(name)).await {
        Ok(label) => {
            info!(label_id = %label.id, "Created label {name:?}");
            Ok(label)
        }
        Err(e) if e.is_conflict() => {
            debug!("Label {name:?} already exists, looking it up");
            client
                .list_labels()
                .await?
                .into_iter()
                .find(|l| l.name == name)
                .ok_or_else(|| GmailError::LabelNotFound {
                    name: name.to_string(),
                })
        }
        Err(e) => Err(e),
    }
}
