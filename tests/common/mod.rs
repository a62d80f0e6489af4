#![allow(dead_code)]

pub mod fixtures {
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    pub const USER_SCHEMA: &str = r#"import { z } from 'zod';

const idSchema = z.string().uuid();

export const userSchema = z.object({
  id: idSchema,
  name: z.string().min(1),
});

export const createUserInput = userSchema.omit({ id: true });
"#;

    pub const USER_ROUTER: &str = r#"import { Inject } from '@nestjs/common';
import { Router, Query, Mutation, UseMiddlewares, Input, Ctx } from 'nestjs-trpc';
import { z } from 'zod';
import { userSchema, createUserInput } from './user.schema';
import { AuthMiddleware } from '../auth/auth.middleware';

const byId = z.object({ id: z.string() });

@Router({ alias: 'users' })
export class UserRouter {
  constructor(@Inject(UserService) private readonly users: UserService) {}

  @Query({ input: byId, output: userSchema })
  getUserById(@Input('id') id: string) {
    return this.users.find(id);
  }

  @UseMiddlewares(AuthMiddleware)
  @Mutation({ input: createUserInput, output: userSchema })
  createUser(@Input() input: CreateUser, @Ctx() ctx: AppContext) {
    return this.users.create(input, ctx.userId);
  }
}
"#;

    pub const AUTH_MIDDLEWARE: &str = r#"import { Injectable } from '@nestjs/common';

@Injectable()
export class AuthMiddleware implements TRPCMiddleware {
  async use(opts: MiddlewareOptions): Promise<MiddlewareResult<{ _ctx_out: { userId: string } }>> {
    return opts.next({ ctx: { userId: 'anonymous' } });
  }
}
"#;

    pub const HEALTH_ROUTER: &str = r#"@Router()
export class HealthRouter {
  @Query({ output: z.literal('ok') })
  ping() {
    return 'ok';
  }
}
"#;

    /// Write a small application source tree into a fresh temporary directory.
    pub fn write_app() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "user/user.schema.ts", USER_SCHEMA);
        write(dir.path(), "user/user.router.ts", USER_ROUTER);
        write(dir.path(), "auth/auth.middleware.ts", AUTH_MIDDLEWARE);
        write(dir.path(), "health.router.ts", HEALTH_ROUTER);
        write(
            dir.path(),
            "node_modules/zod/index.ts",
            "export const z: any = {};",
        );
        write(dir.path(), "types.d.ts", "declare const shouldBeIgnored: number;");
        dir
    }

    pub fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}
