//! User-management screen state: table, pagination, editor form, notices.
//!
//! DESIGN
//! ======
//! CRUD failures never touch the session; they end up as a transient
//! `Danger` notice and the form keeps its values so the user can resubmit.
//! Pagination is client-side over the fetched list.

#[cfg(test)]
#[path = "users_test.rs"]
mod users_test;

use std::sync::Arc;

use tracing::warn;

use crate::i18n::{Language, Message};
use crate::net::api::UsersApi;
use crate::net::types::{ApiError, ManagedUser, UserForm};

pub const ITEMS_PER_PAGE: usize = 10;
/// Rows requested per list call (the API's default cap).
pub const FETCH_LIMIT: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Which dialog, if any, is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Editor {
    #[default]
    Closed,
    Creating,
    Editing(i64),
}

pub struct UsersScreen {
    api: Arc<dyn UsersApi>,
    language: Language,
    users: Vec<ManagedUser>,
    page: usize,
    editor: Editor,
    form: UserForm,
    notice: Option<Notice>,
}

impl UsersScreen {
    pub fn new(api: Arc<dyn UsersApi>, language: Language) -> Self {
        Self {
            api,
            language,
            users: Vec::new(),
            page: 1,
            editor: Editor::Closed,
            form: UserForm::default(),
            notice: None,
        }
    }

    // -------------------------------------------------------------------------
    // Table
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn users(&self) -> &[ManagedUser] {
        &self.users
    }

    /// Reload the full list. Failure keeps the previous rows.
    pub async fn refresh(&mut self) -> bool {
        match self.api.list_users(0, FETCH_LIMIT).await {
            Ok(users) => {
                self.users = users;
                self.page = self.page.clamp(1, self.total_pages());
                true
            }
            Err(e) => {
                warn!(error = %e, "user list fetch failed");
                self.fail(&e, Message::UsersLoadFailed);
                false
            }
        }
    }

    /// At least one page, even when the list is empty.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.users.len().div_ceil(ITEMS_PER_PAGE).max(1)
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.page
    }

    /// Pagination controls only show when there is more than one page.
    #[must_use]
    pub fn shows_pagination(&self) -> bool {
        self.users.len() > ITEMS_PER_PAGE
    }

    #[must_use]
    pub fn page_rows(&self) -> &[ManagedUser] {
        let start = (self.page - 1) * ITEMS_PER_PAGE;
        let end = (start + ITEMS_PER_PAGE).min(self.users.len());
        self.users.get(start..end).unwrap_or_default()
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    // -------------------------------------------------------------------------
    // Editor
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn editor(&self) -> Editor {
        self.editor
    }

    #[must_use]
    pub fn form(&self) -> &UserForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut UserForm {
        &mut self.form
    }

    pub fn open_create(&mut self) {
        self.editor = Editor::Creating;
        self.form = UserForm::default();
    }

    /// Open the editor pre-filled from a loaded row. The password starts
    /// empty, meaning "keep current". Returns `false` for unknown ids.
    pub fn open_edit(&mut self, user_id: i64) -> bool {
        let Some(user) = self.users.iter().find(|u| u.id == user_id) else {
            return false;
        };
        self.form = UserForm { name: user.name.clone(), email: user.email.clone(), password: String::new() };
        self.editor = Editor::Editing(user_id);
        true
    }

    pub fn close_editor(&mut self) {
        self.editor = Editor::Closed;
        self.form = UserForm::default();
    }

    /// Name and email are required; password only when creating.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        let base = !self.form.name.trim().is_empty() && !self.form.email.trim().is_empty();
        match self.editor {
            Editor::Closed => false,
            Editor::Creating => base && !self.form.password.is_empty(),
            Editor::Editing(_) => base,
        }
    }

    /// Create or update from the open editor, then reload the list.
    pub async fn submit(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }
        let (result, done) = match self.editor {
            Editor::Creating => (self.api.create_user(&self.form).await, Message::UserCreated),
            Editor::Editing(id) => (self.api.update_user(id, &self.form).await, Message::UserUpdated),
            Editor::Closed => return false,
        };
        match result {
            Ok(_) => {
                self.succeed(done);
                self.close_editor();
                self.refresh().await;
                true
            }
            Err(e) => {
                warn!(error = %e, "user save failed");
                self.fail(&e, Message::OperationFailed);
                false
            }
        }
    }

    /// Delete a user (confirmation is the caller's job), then reload.
    pub async fn delete(&mut self, user_id: i64) -> bool {
        match self.api.delete_user(user_id).await {
            Ok(()) => {
                self.succeed(Message::UserDeleted);
                self.refresh().await;
                true
            }
            Err(e) => {
                warn!(error = %e, user_id, "user delete failed");
                self.fail(&e, Message::DeleteFailed);
                false
            }
        }
    }

    // -------------------------------------------------------------------------
    // Notices
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn succeed(&mut self, message: Message) {
        self.notice = Some(Notice { kind: NoticeKind::Success, message: message.text(self.language).to_owned() });
    }

    fn fail(&mut self, error: &ApiError, fallback: Message) {
        let message = error.detail().unwrap_or_else(|| fallback.text(self.language)).to_owned();
        self.notice = Some(Notice { kind: NoticeKind::Danger, message });
    }
}
