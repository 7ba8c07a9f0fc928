use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub about: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAvatarRequest {
    #[serde(default)]
    pub avatar: String,
}
