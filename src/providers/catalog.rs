//! Static model catalogs
//!
//! Each built-in provider publishes stable public aliases that map to its
//! native model ids. Unknown aliases pass through untouched so callers can
//! address models that are not listed yet.

use crate::channels::ModelInfo;

pub const HUGGINGFACE: &str = "huggingface";
pub const GITEE: &str = "gitee";
pub const MODELSCOPE: &str = "modelscope";
pub const A4F: &str = "a4f";
pub const DEEPSEEK: &str = "deepseek";
pub const POLLINATIONS: &str = "pollinations";

/// Catalog of one provider
#[derive(Debug)]
pub struct ProviderCatalog {
    pub channel_id: &'static str,
    pub name: &'static str,
    pub image_models: &'static [ModelInfo],
    pub text_models: &'static [ModelInfo],
}

const fn model(id: &'static str, name: &'static str, native_id: &'static str) -> ModelInfo {
    ModelInfo { id, name, native_id }
}

static HUGGINGFACE_IMAGE: &[ModelInfo] = &[
    model("z-image-turbo", "Z-Image Turbo", "z-image-turbo"),
    model("qwen-image", "Qwen Image (fast)", "qwen-image-fast"),
    model("qwen-image-edit", "Qwen Image Edit", "qwen-image-edit"),
    model("flux-1-schnell", "FLUX.1 [schnell]", "flux-1-schnell"),
];

static GITEE_IMAGE: &[ModelInfo] = &[
    model("qwen-image", "Qwen Image", "Qwen-Image"),
    model("z-image-turbo", "Z-Image Turbo", "z-image-turbo"),
    model("flux-1-schnell", "FLUX.1 [schnell]", "FLUX.1-schnell"),
    model("flux-1-krea", "FLUX.1 Krea [dev]", "FLUX_1-Krea-dev"),
];

static GITEE_TEXT: &[ModelInfo] = &[
    model("deepseek-v3", "DeepSeek V3", "DeepSeek-V3"),
    model("qwen3-235b", "Qwen3 235B A22B", "Qwen3-235B-A22B"),
];

static MODELSCOPE_IMAGE: &[ModelInfo] = &[
    model("flux-2", "FLUX.2 [dev]", "black-forest-labs/FLUX.2-dev"),
    model("qwen-image", "Qwen Image", "Qwen/Qwen-Image"),
    model("z-image-turbo", "Z-Image Turbo", "Tongyi-MAI/Z-Image-Turbo"),
];

static A4F_IMAGE: &[ModelInfo] = &[
    model("flux-schnell", "FLUX.1 [schnell]", "provider-4/flux-schnell"),
    model("imagen-4", "Imagen 4", "provider-4/imagen-4"),
];

static A4F_TEXT: &[ModelInfo] = &[
    model("gpt-4o-mini", "GPT-4o mini", "provider-3/gpt-4o-mini"),
    model("deepseek-v3", "DeepSeek V3", "provider-3/deepseek-v3"),
];

static DEEPSEEK_TEXT: &[ModelInfo] = &[
    model("deepseek-chat", "DeepSeek Chat", "deepseek-chat"),
    model("deepseek-reasoner", "DeepSeek Reasoner", "deepseek-reasoner"),
];

static POLLINATIONS_IMAGE: &[ModelInfo] = &[
    model("flux", "Flux", "flux"),
    model("turbo", "Turbo", "turbo"),
    model("gptimage", "GPT Image", "gptimage"),
];

static POLLINATIONS_TEXT: &[ModelInfo] = &[
    model("openai", "OpenAI (Pollinations)", "openai"),
    model("mistral", "Mistral (Pollinations)", "mistral"),
];

static CATALOGS: &[ProviderCatalog] = &[
    ProviderCatalog {
        channel_id: HUGGINGFACE,
        name: "Hugging Face",
        image_models: HUGGINGFACE_IMAGE,
        text_models: &[],
    },
    ProviderCatalog {
        channel_id: GITEE,
        name: "Gitee AI",
        image_models: GITEE_IMAGE,
        text_models: GITEE_TEXT,
    },
    ProviderCatalog {
        channel_id: MODELSCOPE,
        name: "ModelScope",
        image_models: MODELSCOPE_IMAGE,
        text_models: &[],
    },
    ProviderCatalog {
        channel_id: A4F,
        name: "A4F",
        image_models: A4F_IMAGE,
        text_models: A4F_TEXT,
    },
    ProviderCatalog {
        channel_id: DEEPSEEK,
        name: "DeepSeek",
        image_models: &[],
        text_models: DEEPSEEK_TEXT,
    },
    ProviderCatalog {
        channel_id: POLLINATIONS,
        name: "Pollinations",
        image_models: POLLINATIONS_IMAGE,
        text_models: POLLINATIONS_TEXT,
    },
];

/// Catalog of a built-in provider
pub fn catalog(channel_id: &str) -> Option<&'static ProviderCatalog> {
    CATALOGS.iter().find(|c| c.channel_id == channel_id)
}

fn find_alias<'a>(models: &'a [ModelInfo], alias: &str) -> Option<&'a ModelInfo> {
    models
        .iter()
        .find(|m| m.id == alias)
        .or_else(|| models.iter().find(|m| m.id.eq_ignore_ascii_case(alias)))
}

/// Map a public alias to the provider-native id; unknown aliases pass through
pub fn native_model_id(channel_id: &str, alias: &str) -> String {
    catalog(channel_id)
        .and_then(|c| {
            find_alias(c.image_models, alias).or_else(|| find_alias(c.text_models, alias))
        })
        .map(|m| m.native_id.to_string())
        .unwrap_or_else(|| alias.to_string())
}

/// Whether `model` (alias or native id) is in the channel's image catalog
pub fn is_image_model(channel_id: &str, model: &str) -> bool {
    catalog(channel_id)
        .map(|c| {
            c.image_models
                .iter()
                .any(|m| m.id.eq_ignore_ascii_case(model) || m.native_id == model)
        })
        .unwrap_or(false)
}
