//! 비밀번호 해싱.
//!
//! Argon2id 기반 해싱 및 검증. 비용 파라미터는 설정에서 주입됩니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, PasswordHasher as _, Version,
};
use template_core::PasswordConfig;

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("잘못된 Argon2 파라미터: {0}")]
    InvalidParams(String),
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
}

/// Argon2id 비밀번호 해셔.
///
/// 상태는 고정된 알고리즘 파라미터뿐이므로 자유롭게 복제해서 공유할 수 있습니다.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// 설정된 비용 파라미터로 해셔를 생성합니다.
    ///
    /// # Arguments
    ///
    /// * `config` - 메모리(KiB), 반복 횟수, 병렬도
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// 비밀번호를 해싱합니다.
    ///
    /// 호출마다 새 솔트를 생성하므로 같은 입력이라도 결과가 다릅니다.
    ///
    /// # Returns
    ///
    /// PHC 형식의 해시 문자열 (예: `$argon2id$v=19$m=19456,t=2,p=1$...`)
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| PasswordError::HashingFailed)?;

        Ok(hash.to_string())
    }

    /// 비밀번호가 저장된 해시와 일치하는지 확인합니다.
    ///
    /// 해시에 포함된 솔트와 파라미터를 사용합니다. 해시 형식이 잘못되었거나
    /// 검증 중 어떤 실패가 발생해도 `false`를 반환합니다.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
