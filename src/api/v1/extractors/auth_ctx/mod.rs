/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - gateway middleware が extensions に載せた Principal を handler に提供する
 * - HTTP / axum 依存は core に閉じ込める
 *
 * Public API:
 * - AuthCtx
 */

mod core;

pub use core::AuthCtx;
