//! User-visible strings in the two supported languages.

#[cfg(test)]
#[path = "i18n_test.rs"]
mod i18n_test;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    #[default]
    En,
    Ko,
}

impl Language {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ko => "ko",
        }
    }

    /// Parse a stored or user-supplied code. Region suffixes (`ko-KR`) are accepted.
    #[must_use]
    pub fn from_code(raw: &str) -> Option<Self> {
        let primary = raw.trim().split(['-', '_']).next().unwrap_or_default();
        match primary.to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "ko" => Some(Self::Ko),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    LoginFailed,
    RegisterFailed,
    UsersLoadFailed,
    UserCreated,
    UserUpdated,
    UserDeleted,
    OperationFailed,
    DeleteFailed,
    NoUsers,
    Active,
    Inactive,
    SignedOut,
}

impl Message {
    #[must_use]
    pub fn text(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Self::LoginFailed, Language::En) => "Sign in failed. Check your email and password.",
            (Self::LoginFailed, Language::Ko) => "로그인에 실패했습니다. 이메일과 비밀번호를 확인하세요.",
            (Self::RegisterFailed, Language::En) => "Sign up failed.",
            (Self::RegisterFailed, Language::Ko) => "회원가입에 실패했습니다.",
            (Self::UsersLoadFailed, Language::En) => "Failed to load users",
            (Self::UsersLoadFailed, Language::Ko) => "사용자 목록을 불러오는데 실패했습니다",
            (Self::UserCreated, Language::En) => "User created",
            (Self::UserCreated, Language::Ko) => "사용자가 생성되었습니다",
            (Self::UserUpdated, Language::En) => "User updated",
            (Self::UserUpdated, Language::Ko) => "사용자가 수정되었습니다",
            (Self::UserDeleted, Language::En) => "User deleted",
            (Self::UserDeleted, Language::Ko) => "사용자가 삭제되었습니다",
            (Self::OperationFailed, Language::En) => "Operation failed",
            (Self::OperationFailed, Language::Ko) => "작업에 실패했습니다",
            (Self::DeleteFailed, Language::En) => "Failed to delete user",
            (Self::DeleteFailed, Language::Ko) => "사용자 삭제에 실패했습니다",
            (Self::NoUsers, Language::En) => "No users",
            (Self::NoUsers, Language::Ko) => "사용자가 없습니다",
            (Self::Active, Language::En) => "Active",
            (Self::Active, Language::Ko) => "활성",
            (Self::Inactive, Language::En) => "Inactive",
            (Self::Inactive, Language::Ko) => "비활성",
            (Self::SignedOut, Language::En) => "Signed out",
            (Self::SignedOut, Language::Ko) => "로그아웃되었습니다",
        }
    }
}
