#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::procedure::{DecoratorKind, DecoratorMetadata, PLACEHOLDER_IMPLEMENTATION};
use crate::scan::{scan_project, MiddlewareMetadata};

fn project() -> Project {
    Project::from_sources([
        (
            "src/user/user.schema.ts",
            r#"import { z } from 'zod';
const idSchema = z.string().uuid();
export const userSchema = z.object({ id: idSchema, name: z.string() });
"#,
        ),
        (
            "src/user/user.router.ts",
            r#"import { Router, Query, Mutation, UseMiddlewares } from 'nestjs-trpc';
import { z } from 'zod';
import { userSchema } from './user.schema';
import { AuthMiddleware } from '../auth.middleware';

const byIdInput = z.object({ id: z.string() });

@Router({ alias: 'users' })
export class UserRouter {
  @Query({ input: byIdInput, output: userSchema })
  getUserById() {}

  @UseMiddlewares(AuthMiddleware)
  @Mutation({ input: userSchema.omit({ id: true }) })
  createUser() {}

  @UseGuards(AdminGuard)
  internal() {}
}
"#,
        ),
        (
            "src/auth.middleware.ts",
            r#"export class AuthMiddleware {
  use(opts: MiddlewareOptions): Promise<MiddlewareResult<{ _ctx_out: { userId: string } }>> {
    return opts.next();
  }
}
"#,
        ),
        (
            "src/health.router.ts",
            "@Router()\nexport class HealthRouter {\n  @Query()\n  ping() {}\n}\n",
        ),
    ])
    .unwrap()
}

#[test]
fn test_generates_app_router() {
    let project = project();
    let scan = scan_project(&project);
    let out = generate_app_router(&project, &scan, &GeneratorConfig::default()).unwrap();

    assert!(out.starts_with("import { initTRPC } from \"@trpc/server\";\nimport { z } from \"zod\";\n"));
    assert!(out.contains("const t = initTRPC.create();\nconst publicProcedure = t.procedure;\n"));
    assert!(out.contains(
        "const authMiddlewareProcedure = publicProcedure.use(async (opts) => opts.next({ ctx: {} as { userId: string } }));"
    ));
    assert!(out.contains(&format!(
        "getUserById: publicProcedure.input(z.object({{ id: z.string() }})).output(z.object({{ id: z.string().uuid(), name: z.string() }})).query({PLACEHOLDER_IMPLEMENTATION}),"
    )));
    assert!(out.contains(&format!(
        "createUser: authMiddlewareProcedure.input(z.object({{ id: z.string().uuid(), name: z.string() }}).omit({{ id: true }})).mutation({PLACEHOLDER_IMPLEMENTATION}),"
    )));
    assert!(out.contains("  healthRouter: t.router({\n"));
    assert!(out.contains(&format!("ping: publicProcedure.query({PLACEHOLDER_IMPLEMENTATION}),")));
    assert!(out.contains("  users: t.router({\n"));
    assert!(!out.contains("internal"));
    assert!(out.ends_with("export type AppRouter = typeof appRouter;\n"));

    // Routers follow project path order.
    let health = out.find("healthRouter:").unwrap();
    let users = out.find("users:").unwrap();
    assert!(health < users);
}

#[test]
fn test_generation_is_deterministic() {
    let project = project();
    let scan = scan_project(&project);
    let config = GeneratorConfig::default();
    assert_eq!(
        generate_app_router(&project, &scan, &config).unwrap(),
        generate_app_router(&project, &scan, &config).unwrap()
    );
}

#[test]
fn test_unknown_middleware_falls_back_to_procedure_builder() {
    let project = Project::from_sources([(
        "r.ts",
        "@Router()\nclass R {\n  @UseMiddlewares(Missing)\n  @Query()\n  q() {}\n}\n",
    )])
    .unwrap();
    let scan = scan_project(&project);
    let config = GeneratorConfig {
        procedure_builder: "baseProcedure".to_string(),
        placeholder: "impl".to_string(),
        ..GeneratorConfig::default()
    };
    let out = generate_app_router(&project, &scan, &config).unwrap();
    assert!(out.contains("const baseProcedure = t.procedure;"));
    assert!(out.contains("q: baseProcedure.query(impl),"));
    assert!(!out.contains(".use("));
}

#[test]
fn test_middleware_without_shape_gets_no_builder() {
    let project = Project::from_sources([(
        "r.ts",
        r#"class Logger { use(opts: Opts): Promise<void> { return opts.next(); } }
@Router()
class R {
  @UseMiddlewares(Logger)
  @Query()
  q() {}
}
"#,
    )])
    .unwrap();
    let scan = scan_project(&project);
    assert_eq!(scan.middlewares.len(), 1);
    let out = generate_app_router(&project, &scan, &GeneratorConfig::default()).unwrap();
    assert!(out.contains("q: publicProcedure.query("));
    assert!(!out.contains("loggerProcedure"));
}

#[test]
fn test_cyclic_schema_aborts_with_context() {
    let project = Project::from_sources([(
        "r.ts",
        "const a = b.optional();\nconst b = a.nullable();\n@Router()\nclass R {\n  @Query({ input: a })\n  q() {}\n}\n",
    )])
    .unwrap();
    let scan = scan_project(&project);
    let err = generate_app_router(&project, &scan, &GeneratorConfig::default()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Failed to flatten 'input' of @Query on R.q"), "{message}");
    assert!(message.contains("Cyclic schema reference: a -> b -> a"), "{message}");
}

#[test]
fn test_unparsable_argument_is_kept_verbatim() {
    let project = Project::from_sources([("r.ts", "")]).unwrap();
    let scan = ScanOutput {
        routers: vec![RouterMetadata {
            name: "R".to_string(),
            alias: None,
            path: "r.ts".to_string(),
            procedures: vec![ProcedureMetadata {
                name: "q".to_string(),
                decorators: vec![DecoratorMetadata::new(DecoratorKind::Query)
                    .with_argument("input", "not ) valid")],
            }],
        }],
        middlewares: vec![],
    };
    let out = generate_app_router(&project, &scan, &GeneratorConfig::default()).unwrap();
    assert!(out.contains("q: publicProcedure.input(not ) valid).query("));
}

#[test]
fn test_router_in_unknown_file_is_an_error() {
    let project = Project::from_sources([("r.ts", "")]).unwrap();
    let scan = ScanOutput {
        routers: vec![RouterMetadata {
            name: "Ghost".to_string(),
            alias: None,
            path: "missing.ts".to_string(),
            procedures: vec![],
        }],
        middlewares: vec![MiddlewareMetadata {
            name: "Unused".to_string(),
            path: "r.ts".to_string(),
            context_type: "{ _ctx_out: {} }".to_string(),
        }],
    };
    assert!(generate_app_router(&project, &scan, &GeneratorConfig::default()).is_err());
}

#[test]
fn test_router_key() {
    let mut router = RouterMetadata {
        name: "UserRouter".to_string(),
        alias: None,
        path: "a.ts".to_string(),
        procedures: vec![],
    };
    assert_eq!(router_key(&router), "userRouter");
    router.alias = Some("users".to_string());
    assert_eq!(router_key(&router), "users");
    router.alias = Some(String::new());
    assert_eq!(router_key(&router), "userRouter");
}

#[test]
fn test_write_app_router_respects_force() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("@generated").join("server.ts");

    assert!(write_app_router(&path, "first", false).unwrap());
    assert!(!write_app_router(&path, "second", false).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

    assert!(write_app_router(&path, "third", true).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "third");
}
