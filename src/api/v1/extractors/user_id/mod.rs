/*!
 * Path user id extractor
 *
 * Responsibility:
 * - `{user_id}` path segment → u32 (X-User-ID と同じ規則: 10 進数字のみ)
 * - 失敗時は AppError (INVALID_PATH) の JSON body で 400
 *
 * Public API:
 * - UserIdPath
 */

mod core;

pub use core::UserIdPath;
