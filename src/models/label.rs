use crate::models::GmailLabel;

/// Database entity for a Gmail label mirrored locally
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Label {
    pub id: i64,
    pub user_id: i64,
    pub gmail_label_id: String,
    pub name: String,
    /// Stored as "<background>|<text>"
    pub color: Option<String>,
    pub is_default: bool,
    pub description: Option<String>,
}

impl Label {
    /// Splits the stored color back into (background, text).
    pub fn color_pair(&self) -> Option<(String, String)> {
        let color = self.color.as_deref()?;
        let (background, text) = color.split_once('|').unwrap_or((color, ""));
        Some((background.to_string(), text.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct NewLabel {
    pub user_id: i64,
    pub gmail_label_id: String,
    pub name: String,
    pub color: Option<String>,
    pub is_default: bool,
}

impl NewLabel {
    pub fn from_gmail(user_id: i64, label: &GmailLabel) -> Self {
        Self {
            user_id,
            gmail_label_id: label.id.clone(),
            name: label.name.clone(),
            color: label
                .color
                .as_ref()
                .map(|c| format!("{}|{}", c.background_color, c.text_color)),
            is_default: label.is_system(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GmailLabelColor;

    #[test]
    fn color_round_trips_through_storage_format() {
        let gmail = GmailLabel {
            id: "Label_1".to_string(),
            name: "Receipts".to_string(),
            label_type: Some("user".to_string()),
            message_list_visibility: None,
            label_list_visibility: None,
            messages_total: None,
            messages_unread: None,
            color: Some(GmailLabelColor {
                text_color: "#000000".to_string(),
                background_color: "#ffffff".to_string(),
            }),
        };
        let new_label = NewLabel::from_gmail(7, &gmail);
        assert_eq!(new_label.color.as_deref(), Some("#ffffff|#000000"));
        assert!(!new_label.is_default);

        let stored = Label {
            id: 1,
            user_id: 7,
            gmail_label_id: new_label.gmail_label_id,
            name: new_label.name,
            color: new_label.color,
            is_default: false,
            description: None,
        };
        assert_eq!(
            stored.color_pair(),
            Some(("#ffffff".to_string(), "#000000".to_string()))
        );
    }
}
