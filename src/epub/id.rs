//! 随机ID生成
//!
//! 导航点和清单项在调用方未提供ID时使用这里生成的随机字母ID。

use nanoid::nanoid;

/// 随机ID可使用的字符
pub const ID_COMPONENTS: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// 默认ID长度
pub const DEFAULT_ID_LENGTH: usize = 8;

/// 生成默认长度的随机ID
///
/// 不检查冲突，需要唯一性的调用方（如清单）自行重试。
pub fn random_id() -> String {
    random_id_with_length(DEFAULT_ID_LENGTH)
}

/// 生成指定长度的随机ID
pub fn random_id_with_length(length: usize) -> String {
    if length == 0 {
        return String::new();
    }
    nanoid!(length, &ID_COMPONENTS)
}
