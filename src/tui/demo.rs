// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Built-in two-problem solve response used by `--demo`.
pub const DEMO_RESPONSE: &str = r#"### PROBLEM_TEXT
Find the roots of $f(x) = x^2 - 2x - 3$ and sketch the parabola.

### EXPLANATION
#### Step 1: Factor
$$ x^2 - 2x - 3 = (x - 3)(x + 1) $$

#### Step 2: Read off the roots
A product is zero when one factor is zero, so $x = 3$ or $x = -1$.

```plot-function
{"title": "f(x) = x^2 - 2x - 3", "xAxis": {"domain": [-3, 5]}, "data": [{"fn": "x^2 - 2*x - 3"}]}
```

#### Step 3: Check on the board
Move the view with the arrow keys after focusing the board with `Tab`.

```jessecode
A = point(3, 0) <<name: 'A'>>;
B = point(-1, 0) <<name: 'B'>>;
functiongraph(function(x){ return x^2 - 2*x - 3; });
```

### ANSWER
$$ x_1 = -1, \quad x_2 = 3 $$
---PROBLEM_SEPARATOR---
### PROBLEM_TEXT
Describe how to decide whether a quadratic has real roots.

### EXPLANATION
#### Step 1: Use the discriminant
| $\Delta = b^2 - 4ac$ | roots |
|---|---|
| $> 0$ | two real |
| $= 0$ | one double |
| $< 0$ | none |

#### Step 2: Decision flow
```plot-mermaid
graph TD
  A[Compute discriminant] --> B{Sign?}
  B -->|positive| C[Two roots]
  B -->|zero| D[One root]
  B -->|negative| E[No real roots]
```

### ANSWER
Compute $\Delta = b^2 - 4ac$: real roots exist exactly when $\Delta \ge 0$.
"#;

/// Built-in chat message used by `--demo --flow chat`.
pub const DEMO_CHAT: &str = r#"Here is how the pieces of a proof by induction connect:

```plot-mermaid
graph LR
  A[Base case] --> B[Inductive step]
  B --> C[Conclusion]
```

And the graph of the related concepts:

```plot-force
{"nodes": [{"id": "base"}, {"id": "step"}, {"id": "claim"}], "links": [{"source": "base", "target": "claim"}, {"source": "step", "target": "claim"}]}
```

Try proving $\sum_{k=1}^{n} k = \frac{n(n+1)}{2}$ the same way.
"#;
