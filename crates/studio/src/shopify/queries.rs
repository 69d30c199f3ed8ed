//! GraphQL operations for the Shopify Admin API.
//!
//! Each operation implements [`GraphQLQuery`] by hand: the app needs three
//! small documents, so variables and response data are declared next to
//! the document instead of generated from the full Admin schema.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

/// Any object selected only by `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    pub id: String,
}

/// Operations without variables.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoVariables {}

// =============================================================================
// Shop
// =============================================================================

/// `query ShopId`: the shop the access token belongs to.
pub struct ShopIdQuery;

pub mod shop_id {
    use super::Node;
    use serde::Deserialize;

    pub const OPERATION_NAME: &str = "ShopId";
    pub const QUERY: &str = r"
query ShopId {
  shop {
    id
  }
}
";

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub shop: Node,
    }
}

impl GraphQLQuery for ShopIdQuery {
    type Variables = NoVariables;
    type ResponseData = shop_id::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: shop_id::QUERY,
            operation_name: shop_id::OPERATION_NAME,
        }
    }
}

// =============================================================================
// App installation
// =============================================================================

/// `query CurrentAppInstallation`: owner of the app's metafields.
pub struct CurrentAppInstallation;

pub mod current_app_installation {
    use super::Node;
    use serde::Deserialize;

    pub const OPERATION_NAME: &str = "CurrentAppInstallation";
    pub const QUERY: &str = r"
query CurrentAppInstallation {
  currentAppInstallation {
    id
  }
}
";

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub current_app_installation: Node,
    }
}

impl GraphQLQuery for CurrentAppInstallation {
    type Variables = NoVariables;
    type ResponseData = current_app_installation::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: current_app_installation::QUERY,
            operation_name: current_app_installation::OPERATION_NAME,
        }
    }
}

// =============================================================================
// Metafields
// =============================================================================

/// `mutation SetImageSelection`: write block selections as metafields.
pub struct SetImageSelection;

pub mod set_image_selection {
    use serde::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "SetImageSelection";
    pub const QUERY: &str = r"
mutation SetImageSelection($metafields: [MetafieldsSetInput!]!) {
  metafieldsSet(metafields: $metafields) {
    metafields {
      key
      namespace
      value
    }
    userErrors {
      field
      message
      code
    }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub metafields: Vec<MetafieldsSetInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MetafieldsSetInput {
        pub namespace: String,
        pub key: String,
        #[serde(rename = "type")]
        pub type_: String,
        pub value: String,
        pub owner_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub metafields_set: Option<MetafieldsSetPayload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MetafieldsSetPayload {
        #[serde(default)]
        pub user_errors: Vec<UserError>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UserError {
        #[serde(default)]
        pub field: Option<Vec<String>>,
        pub message: String,
    }
}

impl GraphQLQuery for SetImageSelection {
    type Variables = set_image_selection::Variables;
    type ResponseData = set_image_selection::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: set_image_selection::QUERY,
            operation_name: set_image_selection::OPERATION_NAME,
        }
    }
}
