/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: gateway ヘッダ抽出 / RBAC ゲート
 * - input_guard: URL 入力の攻撃パターン検査
 * - cors / http / security_headers: ルータ全体に掛ける横断的関心事
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod input_guard;
pub mod security_headers;
