//! Built-in descriptor (layer 1)
//!
//! The defaults describe a React + TypeScript application exposed as a
//! module-federation remote. A project file only needs to state what
//! differs.

use serde_json::{json, Value};

/// Name of the federated container in the built-in descriptor
pub const DEFAULT_CONTAINER_NAME: &str = "remote";

/// Built-in descriptor as a JSON value for merging
pub fn builtin_descriptor() -> Value {
    json!({
        "entry": {
            "main": "./src/index.tsx"
        },
        "output": {
            "path": "dist",
            "filename": {
                "development": "[name].js",
                "production": "[name].[contenthash].js"
            },
            "public_path": "${PUBLIC_URL:-/}",
            "asset_prefix": "auto",
            "clean": false
        },
        "devtool": {
            "development": "inline-source-map",
            "production": "source-map"
        },
        "module": {
            "rules": [
                {
                    "test": "\\.(ts|tsx)$",
                    "use": [{
                        "loader": "builtin:swc-loader",
                        "options": {
                            "jsc": {
                                "parser": {"syntax": "typescript", "tsx": true},
                                "transform": {"react": {"runtime": "automatic"}}
                            }
                        }
                    }]
                },
                {
                    "test": "\\.css$",
                    "use": ["style-loader", "css-loader"]
                },
                {
                    "test": "\\.(png|jpg|jpeg|gif)$",
                    "flags": "i",
                    "type": "asset/resource"
                },
                {
                    "test": "\\.(woff|woff2|eot|ttf|otf)$",
                    "flags": "i",
                    "type": "asset/resource"
                },
                {
                    "test": "\\.svg$",
                    "flags": "i",
                    "issuer": "\\.[jt]sx?$",
                    "use": ["@svgr/webpack"]
                }
            ]
        },
        "resolve": {
            "extensions": [".tsx", ".ts", ".js", ".jsx"],
            "alias": {
                "components": "src/components",
                "utils": "src/utils",
                "assets": "src/assets"
            }
        },
        "css_modules": {
            "auto": true,
            "local_ident_name": "[name]__[local]___[hash:base64:5]",
            "export_locals_convention": "camelCaseOnly"
        },
        "plugins": [
            {"kind": "react", "runtime": "automatic"},
            {"kind": "svgr", "export_type": "named", "svgo": true},
            {"kind": "clean"},
            {
                "kind": "html",
                "template": "./public/index.html",
                "favicon": "./public/favicon.ico"
            },
            {
                "kind": "type-check",
                "config_file": "tsconfig.json",
                "blocking": {"development": false, "production": true},
                "build_mode": "write-references",
                "memory_limit": 4096,
                "profile": true,
                "semantic": true,
                "syntactic": true,
                "include": ["src/**/*.{ts,tsx}"],
                "exclude": ["node_modules/**/*.{ts,tsx}", "**/*.d.ts"]
            },
            {
                "kind": "define",
                "definitions": {
                    "process.env.REACT_APP_AUTH_BASE_URL": {"env": "REACT_APP_AUTH_BASE_URL"},
                    "process.env.REACT_APP_APPLICATION_BASE_URL": {"env": "REACT_APP_APPLICATION_BASE_URL"}
                }
            },
            {
                "kind": "module-federation",
                "name": DEFAULT_CONTAINER_NAME
            }
        ],
        "dev_server": {
            "static_dir": "public",
            "history_api_fallback": true,
            "port": 9000,
            "hot": true
        },
        "optimization": {
            "module_ids": "deterministic",
            "runtime_chunk": "single",
            "split_chunks": {
                "cache_groups": {
                    "vendor": {
                        "test": "[\\\\/]node_modules[\\\\/]",
                        "name": "vendors",
                        "chunks": "all"
                    }
                }
            }
        }
    })
}
