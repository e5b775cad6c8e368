// ==========================================
// 固件发布记录系统 - 用户数据仓储
// ==========================================
// 职责: 管理 users 表的查询/创建/角色变更
// 红线: create 一律写入 viewer,角色提升只能走 update_role
// ==========================================

use crate::domain::types::Role;
use crate::domain::user::{NewUser, User};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_util::get_enum;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// UserRepository - 用户仓储
// ==========================================
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    /// 创建新的 UserRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按邮箱查询 (不区分大小写,忽略首尾空白)
    ///
    /// # 返回
    /// - `Err(NotFound)`: 邮箱不存在
    pub fn find_by_email(&self, email: &str) -> RepositoryResult<User> {
        let conn = self.get_conn()?;
        let email = email.trim();

        conn.query_row(
            r#"SELECT id, name, email, password_hash, role
               FROM users
               WHERE LOWER(email) = LOWER(?1)"#,
            params![email],
            map_user_row,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("User", email))
    }

    /// 按 id 查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<User> {
        let conn = self.get_conn()?;

        conn.query_row(
            r#"SELECT id, name, email, password_hash, role
               FROM users
               WHERE id = ?1"#,
            params![id],
            map_user_row,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("User", id))
    }

    /// 创建用户 (角色强制为 viewer)
    ///
    /// # 返回
    /// - `Ok(id)`: 新用户主键
    /// - `Err(UniqueConstraintViolation)`: 邮箱已存在
    pub fn create(&self, user: &NewUser) -> RepositoryResult<i64> {
        self.insert(user, Role::Viewer)
    }

    /// 以指定角色创建用户
    ///
    /// 仅供初始化管理员使用,不得暴露给注册入口
    pub fn create_with_role(&self, user: &NewUser, role: Role) -> RepositoryResult<i64> {
        self.insert(user, role)
    }

    /// 变更角色
    pub fn update_role(&self, id: i64, role: Role) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![role.to_db_str(), id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("User", id));
        }
        Ok(())
    }

    fn insert(&self, user: &NewUser, role: Role) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO users (name, email, password_hash, role)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![user.name, user.email, user.password_hash, role.to_db_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

fn map_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: get_enum(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn setup_repo() -> UserRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        UserRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ana".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[test]
    fn test_create_forces_viewer() {
        let repo = setup_repo();
        let id = repo.create(&new_user("ana@example.com")).unwrap();

        let user = repo.find_by_id(id).unwrap();
        assert_eq!(user.role, Role::Viewer);
        assert_eq!(user.email, "ana@example.com");
    }

    #[test]
    fn test_find_by_email_is_case_insensitive() {
        let repo = setup_repo();
        let id = repo.create(&new_user("ana@example.com")).unwrap();

        let user = repo.find_by_email("  ANA@Example.COM ").unwrap();
        assert_eq!(user.id, id);

        let missing = repo.find_by_email("bob@example.com");
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
    }

    #[test]
    fn test_duplicate_email_is_unique_violation() {
        let repo = setup_repo();
        let id = repo.create(&new_user("ana@example.com")).unwrap();

        let err = repo.create(&new_user("Ana@Example.com")).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
        assert_eq!(repo.find_by_email("ana@example.com").unwrap().id, id);
    }

    #[test]
    fn test_update_role() {
        let repo = setup_repo();
        let id = repo.create(&new_user("ana@example.com")).unwrap();

        repo.update_role(id, Role::Editor).unwrap();
        assert_eq!(repo.find_by_id(id).unwrap().role, Role::Editor);

        let err = repo.update_role(id + 100, Role::Admin).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
