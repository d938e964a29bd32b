use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 貸出記録ID - Borrowing集約の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowingId(Uuid);

impl BorrowingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BorrowingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BorrowingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 書籍ID - 貸出記録から参照される（このサービスでは読み取り専用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 利用者ID - 貸出履歴を保持する利用者への参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowerId(Uuid);

impl BorrowerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BorrowerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BorrowerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 貸出ステータス
///
/// 状態遷移は前進のみ：初期状態（ACTIVE） → RETURNED。
/// 逆方向の遷移は存在しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowingStatus {
    /// 貸出中（初期状態）
    #[default]
    Active,
    /// 返却済み（終端状態）
    Returned,
}

impl BorrowingStatus {
    /// 文字列表現を取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowingStatus::Active => "ACTIVE",
            BorrowingStatus::Returned => "RETURNED",
        }
    }
}

impl std::fmt::Display for BorrowingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BorrowingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(BorrowingStatus::Active),
            "RETURNED" => Ok(BorrowingStatus::Returned),
            _ => Err(format!("Invalid borrowing status: {}", s)),
        }
    }
}
