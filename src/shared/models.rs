pub mod schema {
    diesel::table! {
        companies (id) {
            id -> Uuid,
            access_code -> Text,
            company_name -> Text,
            email -> Text,
            phone -> Nullable<Text>,
            logo_url -> Nullable<Text>,
            is_trial -> Bool,
            quote_limit -> Nullable<Int4>,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        access_code_sessions (id) {
            id -> Text,
            company_id -> Uuid,
            access_code -> Text,
            created_at -> Timestamptz,
            expires_at -> Timestamptz,
        }
    }

    diesel::table! {
        customers (id) {
            id -> Uuid,
            company_id -> Uuid,
            name -> Text,
            email -> Text,
            phone -> Nullable<Text>,
            address -> Nullable<Text>,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        quotes (id) {
            id -> Uuid,
            company_id -> Uuid,
            customer_id -> Uuid,
            quote_number -> Text,
            project_type -> Nullable<Text>,
            status -> Text,
            surfaces -> Jsonb,
            paint_products -> Jsonb,
            settings_snapshot -> Jsonb,
            materials_cost -> Numeric,
            labor_cost -> Numeric,
            markup_percentage -> Numeric,
            tax_rate -> Numeric,
            tax_on_materials_only -> Bool,
            subtotal -> Numeric,
            markup_amount -> Numeric,
            tax_amount -> Numeric,
            total_amount -> Numeric,
            description -> Nullable<Text>,
            notes -> Nullable<Text>,
            terms -> Nullable<Text>,
            version -> Int4,
            deleted_at -> Nullable<Timestamptz>,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        company_settings (company_id) {
            company_id -> Uuid,
            settings -> Jsonb,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::allow_tables_to_appear_in_same_query!(
        companies,
        access_code_sessions,
        customers,
        quotes,
        company_settings,
    );
}
