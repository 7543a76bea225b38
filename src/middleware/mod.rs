/*
 * Responsibility
 * - middleware の公開インターフェース
 * - cors: auth/rbac エンドポイント用の CORS ヘッダ
 * - http: request-id / trace / body limit / timeout
 */
pub mod cors;
pub mod http;
