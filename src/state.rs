/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: verify boundary (directory 込み), provisioner: RBAC 管理ツール
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::services::{auth::AuthBoundary, rbac::PermissionProvisioner};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthBoundary>,
    pub provisioner: Arc<PermissionProvisioner>,
}

impl AppState {
    pub fn new(auth: Arc<AuthBoundary>, provisioner: Arc<PermissionProvisioner>) -> Self {
        Self { auth, provisioner }
    }
}
