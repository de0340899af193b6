//! Loading of the signing key from an encrypted JSON keystore.
//!
//! The password is looked up in this order:
//! 1. a literal password (`KEYSTORE_PASSWORD`)
//! 2. explicitly configured password files (`AGENT_KEYSTORE_PASSWORD`,
//!    `KEYSTORE_PASSWORD_PATH`)
//! 3. a `.password` file next to the keystore
//! 4. a `<keystore-stem>-password` file next to the keystore
//!
//! The decrypted key only ever lives inside the returned signer.

use {
    alloy::{
        primitives::Address,
        signers::local::{LocalSignerError, PrivateKeySigner},
    },
    std::path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("keystore not found at {0} (set AGENT_KEYSTORE or pass --keystore)")]
    KeystoreMissing(PathBuf),
    #[error(
        "no keystore password found, set KEYSTORE_PASSWORD or create one of: {}",
        .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    PasswordMissing(Vec<PathBuf>),
    #[error("failed to read password file {0}: {1}")]
    PasswordUnreadable(PathBuf, std::io::Error),
    #[error("password file {0} is empty")]
    PasswordEmpty(PathBuf),
    #[error("failed to decrypt keystore {0} (wrong password?): {1}")]
    Decrypt(PathBuf, LocalSignerError),
    #[error("failed to read keystore {0}: {1}")]
    KeystoreUnreadable(PathBuf, std::io::Error),
    #[error("keystore {0} has no valid address field")]
    KeystoreAddress(PathBuf),
    #[error("keystore task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Where to find the keystore and its password.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    pub keystore: PathBuf,
    /// Password given directly, wins over every file.
    pub password: Option<String>,
    /// Password files configured explicitly, tried in order.
    pub password_files: Vec<PathBuf>,
}

impl Credentials {
    /// All password files that are consulted, explicit ones first.
    pub fn password_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = self.password_files.clone();
        let dir = self
            .keystore
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        candidates.push(dir.join(".password"));
        if let Some(stem) = self.keystore.file_stem() {
            let mut name = stem.to_os_string();
            name.push("-password");
            candidates.push(dir.join(name));
        }
        candidates
    }

    /// Resolves the password. Whitespace around it is ignored.
    pub fn resolve_password(&self) -> Result<String, Error> {
        if let Some(password) = self.password.as_deref().map(str::trim) {
            if !password.is_empty() {
                return Ok(password.to_string());
            }
        }
        let candidates = self.password_candidates();
        for path in &candidates {
            if !path.is_file() {
                continue;
            }
            let contents = std::fs::read_to_string(path)
                .map_err(|err| Error::PasswordUnreadable(path.clone(), err))?;
            let password = contents.trim();
            if password.is_empty() {
                return Err(Error::PasswordEmpty(path.clone()));
            }
            tracing::debug!(file = %path.display(), "using keystore password file");
            return Ok(password.to_string());
        }
        Err(Error::PasswordMissing(candidates))
    }

    /// The address recorded in the keystore. Reading it needs no password.
    pub fn address(&self) -> Result<Address, Error> {
        if !self.keystore.is_file() {
            return Err(Error::KeystoreMissing(self.keystore.clone()));
        }
        let contents = std::fs::read_to_string(&self.keystore)
            .map_err(|err| Error::KeystoreUnreadable(self.keystore.clone(), err))?;
        serde_json::from_str::<serde_json::Value>(&contents)
            .ok()
            .as_ref()
            .and_then(|json| json.get("address"))
            .and_then(serde_json::Value::as_str)
            .and_then(|address| {
                let address = address.strip_prefix("0x").unwrap_or(address);
                format!("0x{address}").parse().ok()
            })
            .ok_or_else(|| Error::KeystoreAddress(self.keystore.clone()))
    }

    /// Decrypts the keystore. Key derivation is deliberately slow so it runs
    /// on the blocking thread pool.
    pub async fn signer(&self) -> Result<PrivateKeySigner, Error> {
        if !self.keystore.is_file() {
            return Err(Error::KeystoreMissing(self.keystore.clone()));
        }
        let password = self.resolve_password()?;
        let keystore = self.keystore.clone();
        let signer = tokio::task::spawn_blocking(move || {
            PrivateKeySigner::decrypt_keystore(&keystore, password)
                .map_err(|err| Error::Decrypt(keystore, err))
        })
        .await??;
        tracing::debug!(address = %signer.address(), "loaded signer");
        Ok(signer)
    }
}

/// Writes a new random key as an encrypted keystore into `dir` and returns
/// the signer together with the file name.
pub async fn create(dir: &Path, password: String) -> anyhow::Result<(PrivateKeySigner, PathBuf)> {
    tokio::fs::create_dir_all(dir).await?;
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut rng = rand::thread_rng();
        let (signer, name) = PrivateKeySigner::new_keystore(&dir, &mut rng, password, None)?;
        Ok::<_, anyhow::Error>((signer, dir.join(name)))
    })
    .await?
}

#[cfg(test)]
mod tests {
    use {super::*, std::fs};

    fn credentials(dir: &Path) -> Credentials {
        Credentials {
            keystore: dir.join("agent.json"),
            ..Default::default()
        }
    }

    #[test]
    fn literal_password_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".password"), "from-file").unwrap();
        let credentials = Credentials {
            password: Some(" literal \n".into()),
            ..credentials(dir.path())
        };
        assert_eq!(credentials.resolve_password().unwrap(), "literal");
    }

    #[test]
    fn explicit_file_before_sibling_files() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("secret.txt");
        fs::write(&explicit, "explicit\n").unwrap();
        fs::write(dir.path().join(".password"), "sibling").unwrap();
        let credentials = Credentials {
            password_files: vec![dir.path().join("missing.txt"), explicit],
            ..credentials(dir.path())
        };
        assert_eq!(credentials.resolve_password().unwrap(), "explicit");
    }

    #[test]
    fn falls_back_to_stem_password_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("agent-password"), "stem").unwrap();
        assert_eq!(credentials(dir.path()).resolve_password().unwrap(), "stem");
    }

    #[test]
    fn missing_password_lists_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let err = credentials(dir.path()).resolve_password().unwrap_err();
        let Error::PasswordMissing(candidates) = &err else {
            panic!("unexpected error {err}");
        };
        assert_eq!(candidates.len(), 2);
        assert!(err.to_string().contains("agent-password"));
    }

    #[test]
    fn empty_password_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".password"), "  \n").unwrap();
        assert!(matches!(
            credentials(dir.path()).resolve_password(),
            Err(Error::PasswordEmpty(_))
        ));
    }

    #[test]
    fn address_without_password() {
        let dir = tempfile::tempdir().unwrap();
        let keystore = dir.path().join("agent.json");
        fs::write(
            &keystore,
            r#"{"address":"1d80c49bbbcd1c0911346656b529df9e5c2f783d","crypto":{}}"#,
        )
        .unwrap();
        let credentials = Credentials {
            keystore: keystore.clone(),
            ..Default::default()
        };
        assert_eq!(
            credentials.address().unwrap(),
            "0x1D80c49BbBCd1C0911346656B529DF9E5c2F783d".parse::<Address>().unwrap()
        );

        fs::write(&keystore, "{}").unwrap();
        assert!(matches!(
            credentials.address(),
            Err(Error::KeystoreAddress(_))
        ));
    }

    #[tokio::test]
    async fn missing_keystore() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            credentials(dir.path()).signer().await,
            Err(Error::KeystoreMissing(_))
        ));
    }

    #[tokio::test]
    async fn decrypts_created_keystore() {
        let dir = tempfile::tempdir().unwrap();
        let (created, path) = create(dir.path(), "hunter2".into()).await.unwrap();
        let credentials = Credentials {
            keystore: path,
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let loaded = credentials.signer().await.unwrap();
        assert_eq!(loaded.address(), created.address());
        assert_eq!(credentials.address().unwrap(), created.address());

        let wrong = Credentials {
            password: Some("wrong".into()),
            ..credentials
        };
        assert!(matches!(wrong.signer().await, Err(Error::Decrypt(..))));
    }
}
